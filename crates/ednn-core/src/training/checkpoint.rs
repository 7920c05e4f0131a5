use ednn_training::{CheckpointInfo, CheckpointLoader, Device, TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use super::process_trainer::ProcessMember;

/// On-disk checkpoint written by the training driver.
///
/// Model and optimizer state are opaque to the orchestrator; only `epoch`
/// is interpreted. It is the last completed epoch counted from 1, so a
/// run that finished every epoch has `epoch == epochs` and a driver that
/// resumes from `epoch` starts at `epoch + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCheckpoint {
    pub epoch: u32,
    pub model_state: serde_json::Value,
    pub optimizer_state: serde_json::Value,
    #[serde(default)]
    pub best_epoch: Option<u32>,
    #[serde(default)]
    pub best_val_loss: Option<f64>,
}

impl JsonCheckpoint {
    /// `Ok(None)` when no file exists at `path`.
    pub fn read(path: &Path) -> TrainingResult<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint = serde_json::from_slice(&bytes).map_err(|e| {
            TrainingError::Checkpoint(format!("malformed checkpoint {}: {e}", path.display()))
        })?;
        Ok(Some(checkpoint))
    }

    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCheckpointLoader;

impl CheckpointLoader<ProcessMember> for JsonCheckpointLoader {
    fn load(&self, member: &mut ProcessMember, path: &Path, device: Device) -> TrainingResult<Option<CheckpointInfo>> {
        let Some(checkpoint) = JsonCheckpoint::read(path)? else {
            debug!(path = %path.display(), "no checkpoint found");
            return Ok(None);
        };

        info!(path = %path.display(), epoch = checkpoint.epoch, device = %device, "restored checkpoint");
        let epoch = checkpoint.epoch;
        member.device = device;
        member.restored = Some(checkpoint);
        Ok(Some(CheckpointInfo { epoch }))
    }
}
