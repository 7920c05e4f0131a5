use crate::error::TrainingResult;
use crate::loss::LossMode;
use std::path::{Path, PathBuf};

/// Filesystem layout for ensemble checkpoints.
///
/// `<root>/<loss_mode>/model_<index>.pth`, one directory per loss mode.
#[derive(Debug, Clone)]
pub struct CheckpointLayout {
    root: PathBuf,
}

impl CheckpointLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn mode_dir(&self, loss_mode: LossMode) -> PathBuf {
        self.root.join(loss_mode.as_str())
    }

    #[must_use]
    pub fn member_checkpoint_path(&self, loss_mode: LossMode, index: usize) -> PathBuf {
        self.mode_dir(loss_mode).join(format!("model_{index}.pth"))
    }

    #[must_use]
    pub fn ensemble_manifest_path(&self, loss_mode: LossMode) -> PathBuf {
        self.mode_dir(loss_mode).join("ensemble_manifest.json")
    }

    pub fn ensure_mode_dir(&self, loss_mode: LossMode) -> TrainingResult<PathBuf> {
        let dir = self.mode_dir(loss_mode);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
