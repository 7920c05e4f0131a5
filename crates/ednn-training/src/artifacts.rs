use crate::dataset::DatasetId;
use crate::error::{TrainingError, TrainingResult};
use crate::job::{Device, TrainingRunId};
use crate::loss::{LossMode, MetricsToken};
use crate::trainer::TrainingOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberArtifact {
    pub index: usize,
    pub seed: u64,
    pub checkpoint_path: PathBuf,
    /// `None` when the driver did not leave a checkpoint behind.
    pub sha256: Option<String>,
    pub resumed_from: Option<u32>,
    #[serde(default)]
    pub outcome: TrainingOutcome,
}

/// Summary of one loss mode's ensemble, written after all members finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleManifest {
    pub run_id: TrainingRunId,
    pub created_at: DateTime<Utc>,
    pub loss_mode: LossMode,
    pub metrics_token: MetricsToken,
    pub trainer: String,
    pub device: Device,
    pub dataset_id: DatasetId,
    pub members: Vec<MemberArtifact>,
}

impl EnsembleManifest {
    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read(path: &Path) -> TrainingResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Hash the checkpoint if the driver produced one.
pub fn hash_if_present(path: &Path) -> TrainingResult<Option<String>> {
    match sha256_file(path) {
        Ok(hash) => Ok(Some(hash)),
        Err(TrainingError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
