//! Collaborator seams of the orchestrator.
//!
//! Model construction, checkpoint restoration and the training loop itself
//! live behind these traits. The orchestrator only sequences calls to them.

use crate::error::TrainingResult;
use crate::job::{Device, MemberSpec, TrainingJob};
use crate::progress::ProgressSink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the orchestrator needs to know about a restored checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    /// Last completed epoch.
    pub epoch: u32,
}

/// Result of one training-driver invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub final_epoch: Option<u32>,
    pub best_epoch: Option<u32>,
    pub best_val_loss: Option<f64>,
    #[serde(default)]
    pub stopped_early: bool,
}

/// Builds a fresh model + optimizer pair for an ensemble member.
pub trait ModelFactory: Send + Sync {
    type Member: Send;

    fn build(&self, spec: &MemberSpec, device: Device) -> TrainingResult<Self::Member>;
}

/// Restores member state from `path` when a checkpoint exists there.
///
/// Returns `Ok(None)` when there is nothing to restore.
pub trait CheckpointLoader<M>: Send + Sync {
    fn load(&self, member: &mut M, path: &Path, device: Device) -> TrainingResult<Option<CheckpointInfo>>;
}

/// Training loop with early stopping. Owns all checkpoint writes.
#[async_trait]
pub trait Trainer<M: Send>: Send + Sync {
    fn id(&self) -> &'static str;

    async fn train(
        &self,
        member: &mut M,
        job: &TrainingJob,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<TrainingOutcome>;
}
