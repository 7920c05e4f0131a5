//! CLI configuration loading.

use anyhow::{Context, Result};
use ednn_training::EnsembleConfig;
use std::path::Path;

/// Load the ensemble configuration.
///
/// Precedence:
/// 1. `--config <path>`
/// 2. `./ednn.toml`
/// 3. Defaults
pub fn load_config(explicit: Option<&Path>) -> Result<EnsembleConfig> {
    let config = EnsembleConfig::discover_and_load(explicit).with_context(|| match explicit {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load ./ednn.toml".to_string(),
    })?;
    config.validate().context("Invalid ensemble configuration")?;
    Ok(config)
}
