use crate::config::load_config;
use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

pub fn execute(config_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let base = &config.output.model_save_base;
    let ensembles = ednn_training::discover_ensembles(base)
        .with_context(|| format!("Failed to discover ensembles under {}", base.display()))?;

    if json_output {
        let out: Vec<_> = ensembles
            .iter()
            .map(|e| {
                json!({
                    "loss_mode": e.loss_mode,
                    "metrics_token": e.manifest.metrics_token,
                    "run_id": e.manifest.run_id.0,
                    "created_at": e.manifest.created_at,
                    "dataset_id": e.manifest.dataset_id.0,
                    "members": e.manifest.members.len(),
                    "completed_members": e.completed_members(),
                    "manifest": e.manifest_path,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Trained Ensembles ({})", ensembles.len()).bold().cyan());
    println!();

    if ensembles.is_empty() {
        println!("  {}", format!("No ensembles found under {}.", base.display()).dimmed());
        println!();
        println!("  {}", "Tip: run `ednn train` to produce checkpoints.".dimmed());
        return Ok(());
    }

    println!("{:<12} {:<12} {:<10} {}", "Loss mode", "Metrics", "Members", "Created");
    println!("{}", "─".repeat(70));
    for e in ensembles {
        println!(
            "{:<12} {:<12} {:<10} {}",
            e.loss_mode.as_str().cyan(),
            e.manifest.metrics_token.as_str(),
            format!("{}/{}", e.completed_members(), e.manifest.members.len()),
            e.manifest.created_at.to_rfc3339().dimmed()
        );
    }
    println!();
    Ok(())
}
