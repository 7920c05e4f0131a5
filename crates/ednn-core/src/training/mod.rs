//! Training backends.
//!
//! The backend-agnostic types live in `ednn-training`. This module contains
//! the concrete collaborators used by the `ednn` binary.

pub mod checkpoint;
pub mod process_trainer;

pub use checkpoint::{JsonCheckpoint, JsonCheckpointLoader};
pub use process_trainer::{ProcessMember, ProcessModelFactory, ProcessTrainer};
