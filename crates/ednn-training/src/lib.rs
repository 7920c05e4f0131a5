//! EDNN Training
//!
//! Backend-agnostic pieces for training evidential regression ensembles:
//! - Run configuration (`EnsembleConfig`)
//! - Tabular datasets and seeded train/validation splits
//! - Loss modes and the metrics registry
//! - Collaborator traits (`ModelFactory`, `CheckpointLoader`, `Trainer`)
//! - The `Orchestrator` that sequences ensemble members

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod job;
pub mod layout;
pub mod loss;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod split;
pub mod trainer;

pub use artifacts::{EnsembleManifest, MemberArtifact};
pub use config::{DriverConfig, EnsembleConfig};
pub use dataset::{DatasetId, Sample, TabularDataset};
pub use error::{TrainingError, TrainingResult};
pub use job::{Activation, DatasetRef, Device, MemberSpec, ModelConfig, OptimizerConfig, OutputHead, TrainingJob, TrainingRunId};
pub use layout::CheckpointLayout;
pub use loss::{resolve_metrics_token, LossMode, MetricsToken};
pub use metrics::MetricsRegistry;
pub use orchestrator::{MemberReport, Orchestrator, PlannedMember, PreparedData, RunSummary};
pub use progress::{NullProgressSink, ProgressEvent, ProgressSink, StdoutProgressSink};
pub use registry::{discover_ensembles, EnsembleEntry};
pub use split::{random_split, DataLoader, Split};
pub use trainer::{CheckpointInfo, CheckpointLoader, ModelFactory, Trainer, TrainingOutcome};
