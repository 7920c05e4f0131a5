use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid ensemble config: {0}")]
    InvalidConfig(String),

    #[error("unknown loss mode: {0:?} (expected one of nll, full, variational, kl, mse, abs)")]
    UnknownLossMode(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("trainer error: {0}")]
    Trainer(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
