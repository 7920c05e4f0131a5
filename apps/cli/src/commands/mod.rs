//! Command implementations for the EDNN CLI.

pub mod init_config;
pub mod list;
pub mod metrics;
pub mod plan;
pub mod train;
pub mod types;
