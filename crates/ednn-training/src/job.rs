use crate::dataset::DatasetId;
use crate::error::{TrainingError, TrainingResult};
use crate::loss::{LossMode, MetricsToken};
use crate::split::DataLoader;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingRunId(pub String);

impl TrainingRunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TrainingRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrainingRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputHead {
    /// Single point estimate.
    Point,
    /// Normal-Inverse-Gamma parameters (gamma, nu, alpha, beta).
    Evidential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    LeakyRelu,
    Tanh,
    Gelu,
    Sigmoid,
}

/// Hyperparameters shared by every ensemble member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub input_dim: usize,
    pub hidden_dims: Vec<usize>,
    pub output_type: OutputHead,
    pub use_dropout: bool,
    pub dropout_p: f64,
    pub flatten_input: bool,
    pub use_batchnorm: bool,
    pub activation: Activation,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_dim: 13,
            hidden_dims: vec![64, 64],
            output_type: OutputHead::Evidential,
            use_dropout: false,
            dropout_p: 0.2,
            flatten_input: false,
            use_batchnorm: false,
            activation: Activation::Relu,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.input_dim == 0 {
            return Err(TrainingError::InvalidConfig("model.input_dim must be >= 1".to_string()));
        }
        if self.hidden_dims.is_empty() || self.hidden_dims.contains(&0) {
            return Err(TrainingError::InvalidConfig(
                "model.hidden_dims must be non-empty and every width >= 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_p) {
            return Err(TrainingError::InvalidConfig("model.dropout_p must be in [0, 1)".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub learning_rate: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { kind: OptimizerKind::Adam, learning_rate: 1e-3 }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> TrainingResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::InvalidConfig("optimizer.learning_rate must be > 0".to_string()));
        }
        Ok(())
    }
}

/// One ensemble member: everything needed to build its model and optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub index: usize,
    pub seed: u64,
    pub model: ModelConfig,
    pub optimizer: OptimizerConfig,
}

impl MemberSpec {
    /// Members are seeded `base_seed + index`.
    #[must_use]
    pub fn new(index: usize, base_seed: u64, model: ModelConfig, optimizer: OptimizerConfig) -> Self {
        Self { index, seed: base_seed.wrapping_add(index as u64), model, optimizer }
    }
}

/// Dataset reference carried by a job so out-of-process drivers can reload it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub csv_path: PathBuf,
    pub dataset_id: DatasetId,
    pub target_column: Option<String>,
}

/// A single training-driver invocation for one ensemble member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJob {
    pub run_id: TrainingRunId,
    pub loss_mode: LossMode,
    pub metrics_token: MetricsToken,
    pub member: MemberSpec,
    pub checkpoint_path: PathBuf,
    pub device: Device,
    pub epochs: u32,
    pub patience: u32,
    /// Last completed epoch of an existing checkpoint; `None` trains from scratch.
    pub resume_epoch: Option<u32>,
    pub dataset: DatasetRef,
    pub train: DataLoader,
    pub val: DataLoader,
}

impl TrainingJob {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.device == Device::Auto {
            return Err(TrainingError::InvalidConfig("job device must be resolved before training".to_string()));
        }
        if self.epochs == 0 {
            return Err(TrainingError::InvalidConfig("epochs must be >= 1".to_string()));
        }
        if self.train.is_empty() {
            return Err(TrainingError::InvalidConfig("train split is empty".to_string()));
        }
        self.member.model.validate()?;
        self.member.optimizer.validate()?;
        Ok(())
    }
}
