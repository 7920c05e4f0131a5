//! EDNN Core
//!
//! Concrete collaborators for the ensemble orchestrator: device detection,
//! JSON checkpoints and the out-of-process training driver.

pub mod device;
pub mod training;

pub use device::{cuda_available, resolve_device};
pub use training::{JsonCheckpoint, JsonCheckpointLoader, ProcessMember, ProcessModelFactory, ProcessTrainer};
