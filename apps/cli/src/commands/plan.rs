//! Dry-run: show which members would train fresh and which would resume.

use crate::commands::types::DeviceArg;
use crate::config::load_config;
use anyhow::{Context, Result};
use colored::Colorize;
use ednn_core::{resolve_device, JsonCheckpointLoader, ProcessModelFactory, ProcessTrainer};
use ednn_training::Orchestrator;
use std::path::PathBuf;

pub fn execute(config_path: Option<PathBuf>, device: Option<DeviceArg>, json_output: bool) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let device = resolve_device(device.map_or(config.device, Into::into));

    let trainer = ProcessTrainer::new(config.driver.clone());
    let orchestrator = Orchestrator::new(config, ProcessModelFactory, JsonCheckpointLoader, trainer);
    let planned = orchestrator.plan(device).context("Failed to plan ensemble run")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Planned members ({}) on {device}", planned.len()).bold().cyan());
    println!();
    println!("{:<12} {:<6} {:<6} {:<12} {:<14} {}", "Loss mode", "Index", "Seed", "Metrics", "Start", "Checkpoint");
    println!("{}", "─".repeat(90));
    for member in planned {
        let start = member
            .resume_epoch
            .map_or_else(|| "fresh".to_string(), |epoch| format!("resume@{epoch}"));
        println!(
            "{:<12} {:<6} {:<6} {:<12} {:<14} {}",
            member.loss_mode.as_str().cyan(),
            member.index,
            member.seed,
            member.metrics_token.as_str(),
            start,
            member.checkpoint_path.display().to_string().dimmed()
        );
    }
    println!();
    Ok(())
}
