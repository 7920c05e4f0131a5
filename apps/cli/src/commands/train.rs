//! Training command implementation.

use crate::commands::types::DeviceArg;
use crate::config::load_config;
use anyhow::{Context, Result};
use colored::Colorize;
use ednn_core::{resolve_device, JsonCheckpointLoader, ProcessModelFactory, ProcessTrainer};
use ednn_training::{NullProgressSink, Orchestrator, StdoutProgressSink};
use std::path::PathBuf;

pub async fn execute(config_path: Option<PathBuf>, device: Option<DeviceArg>, json_output: bool) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let device = resolve_device(device.map_or(config.device, Into::into));

    let trainer = ProcessTrainer::new(config.driver.clone());
    let orchestrator = Orchestrator::new(config, ProcessModelFactory, JsonCheckpointLoader, trainer);

    let summary = if json_output {
        orchestrator.run(device, &NullProgressSink).await
    } else {
        orchestrator.run(device, &StdoutProgressSink).await
    }
    .context("Ensemble training failed")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let resumed = summary.members.iter().filter(|m| m.resumed_from.is_some()).count();
    println!();
    println!("{}", "Ensemble training complete".bold().green());
    println!("  Run: {}", summary.run_id.0.cyan());
    println!("  Device: {}", summary.device);
    println!("  Split: {} train / {} val", summary.train_size, summary.val_size);
    println!("  Members: {} ({} resumed)", summary.members.len(), resumed);
    println!(
        "  Checkpoints: {}",
        orchestrator.layout().root().display().to_string().dimmed()
    );
    println!();
    Ok(())
}
