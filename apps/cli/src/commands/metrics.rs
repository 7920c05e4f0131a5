use anyhow::Result;
use colored::Colorize;
use ednn_training::MetricsRegistry;
use serde_json::json;

pub fn execute(json_output: bool) -> Result<()> {
    let registry = MetricsRegistry::default();

    if json_output {
        let out: serde_json::Map<String, serde_json::Value> = registry
            .bundles()
            .iter()
            .map(|(token, metrics)| (token.as_str().to_string(), json!(metrics)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", "Available metric tokens".bold().cyan());
    println!();
    for (token, metrics) in registry.bundles() {
        println!("  {:<14} {}", token.as_str().cyan(), metrics.join(", ").dimmed());
    }
    println!();
    Ok(())
}
