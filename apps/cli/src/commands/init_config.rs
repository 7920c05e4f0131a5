use anyhow::{Context, Result};
use colored::Colorize;
use ednn_training::config::DEFAULT_CONFIG_FILE;
use ednn_training::EnsembleConfig;
use std::path::PathBuf;

pub fn execute(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to overwrite)", path.display());
    }

    EnsembleConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
