//! Ensemble run configuration.
//!
//! Defaults reproduce the Boston Housing setup; a TOML file only needs the
//! keys it overrides.

use crate::error::{TrainingError, TrainingResult};
use crate::job::{Device, ModelConfig, OptimizerConfig};
use crate::loss::LossMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ednn.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Seeds the split and, offset by member index, every member.
    pub seed: u64,
    pub device: Device,
    pub dataset: DatasetConfig,
    pub split: SplitConfig,
    pub model: ModelConfig,
    pub optimizer: OptimizerConfig,
    pub ensemble: EnsembleSection,
    pub output: OutputConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub csv_path: PathBuf,
    /// Target column name; the last column when unset.
    pub target_column: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("assets/data/raw/dataset__boston-housing/dataset__boston-housing.csv"),
            target_column: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub batch_size: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { train_fraction: 0.8, batch_size: 16 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSection {
    pub size: usize,
    pub loss_modes: Vec<LossMode>,
    pub epochs: u32,
    pub patience: u32,
}

impl Default for EnsembleSection {
    fn default() -> Self {
        Self { size: 5, loss_modes: vec![LossMode::Mse], epochs: 100, patience: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub model_save_base: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { model_save_base: PathBuf::from("assets/models/pth/ednn_regression__boston_housing") }
    }
}

/// External training-driver command. The job file path is appended to `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { program: "ednn-driver".to_string(), args: Vec::new() }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            device: Device::Auto,
            dataset: DatasetConfig::default(),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
            optimizer: OptimizerConfig::default(),
            ensemble: EnsembleSection::default(),
            output: OutputConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl EnsembleConfig {
    pub fn load_from_file(path: &Path) -> TrainingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainingError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> TrainingResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrainingError::InvalidConfig(format!("failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Explicit path if given, else `./ednn.toml` when present, else defaults.
    pub fn discover_and_load(explicit: Option<&Path>) -> TrainingResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.ensemble.size == 0 {
            return Err(TrainingError::InvalidConfig("ensemble.size must be >= 1".to_string()));
        }
        if self.ensemble.epochs == 0 {
            return Err(TrainingError::InvalidConfig("ensemble.epochs must be >= 1".to_string()));
        }
        if self.ensemble.loss_modes.is_empty() {
            return Err(TrainingError::InvalidConfig("ensemble.loss_modes must not be empty".to_string()));
        }
        if self.split.batch_size == 0 {
            return Err(TrainingError::InvalidConfig("split.batch_size must be >= 1".to_string()));
        }
        let fraction = self.split.train_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(TrainingError::InvalidConfig("split.train_fraction must be in (0, 1)".to_string()));
        }
        if self.driver.program.trim().is_empty() {
            return Err(TrainingError::InvalidConfig("driver.program is required".to_string()));
        }
        self.model.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}
