//! EDNN CLI - trains evidential regression ensembles.
//!
//! Running `ednn` with no subcommand trains the configured ensemble, resuming
//! any member that already has a checkpoint.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::types::DeviceArg;
use commands::{init_config, list, metrics, plan, train};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// EDNN - evidential regression ensemble trainer
#[derive(Parser, Debug)]
#[command(
    name = "ednn",
    author,
    version,
    about = "Train ensembles of evidential regression models",
    long_about = "Trains an ensemble of feed-forward regressors per loss mode, delegating each member to an external training driver and resuming from existing checkpoints."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Config file (defaults to ./ednn.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train every ensemble member of every configured loss mode
    Train {
        /// Override the configured device
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the jobs a training run would dispatch, without training
    Plan {
        /// Override the configured device
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available metric bundles
    Metrics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List trained ensembles under the model directory
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to a TOML file
    InitConfig {
        /// Target path (defaults to ./ednn.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = args.command.unwrap_or(Command::Train { device: None, json: false });
    let config_path = args.config;

    match command {
        Command::Train { device, json } => train::execute(config_path, device, json).await?,
        Command::Plan { device, json } => plan::execute(config_path, device, json)?,
        Command::Metrics { json } => metrics::execute(json)?,
        Command::List { json } => list::execute(config_path, json)?,
        Command::InitConfig { path, force } => init_config::execute(path, force)?,
    }

    Ok(())
}
