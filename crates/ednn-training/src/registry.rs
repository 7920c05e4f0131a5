use crate::artifacts::EnsembleManifest;
use crate::error::TrainingResult;
use crate::loss::LossMode;
use std::path::{Path, PathBuf};

/// A trained ensemble found on disk.
#[derive(Debug, Clone)]
pub struct EnsembleEntry {
    pub loss_mode: LossMode,
    pub manifest_path: PathBuf,
    pub manifest: EnsembleManifest,
}

impl EnsembleEntry {
    /// Members whose checkpoint file was present when the manifest was written.
    #[must_use]
    pub fn completed_members(&self) -> usize {
        self.manifest.members.iter().filter(|m| m.sha256.is_some()).count()
    }
}

/// Discover ensembles by scanning `<base>/*/ensemble_manifest.json`.
///
/// Directories that are not loss-mode tags are ignored.
pub fn discover_ensembles(base: &Path) -> TrainingResult<Vec<EnsembleEntry>> {
    let mut out = Vec::new();

    let dir = match std::fs::read_dir(base) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };

    for entry in dir {
        let entry = entry?;
        let mode_dir = entry.path();
        if !mode_dir.is_dir() {
            continue;
        }
        let Some(loss_mode) = mode_dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<LossMode>().ok())
        else {
            continue;
        };
        let manifest_path = mode_dir.join("ensemble_manifest.json");
        if !manifest_path.exists() {
            continue;
        }
        let manifest = EnsembleManifest::read(&manifest_path)?;
        out.push(EnsembleEntry { loss_mode, manifest_path, manifest });
    }

    out.sort_by_key(|e| e.loss_mode);
    Ok(out)
}
