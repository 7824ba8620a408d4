//! Admin sidecar.
//!
//! Runs a server process (nginx by default) in the foreground, exposes an
//! admin port to control it, and rotates its log files on a schedule.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                  ADMIN SIDECAR                   │
//!                 │                                                  │
//!   GET /admin/*  │  ┌─────────────┐   kill/quit/hangup  ┌─────────┐ │
//!  ───────────────┼─▶│ admin server│────────────────────▶│ process │─┼──▶ nginx
//!                 │  └─────────────┘                     │ manager │ │
//!                 │         ▲ close on exit              └────┬────┘ │
//!                 │         └─────────────────────────────────┘      │
//!                 │                                          ▲ USR1  │
//!                 │  ┌─────────────┐  rename / prune         │       │
//!   log files ◀───┼──│ log rotator │─────────────────────────┘       │
//!                 │  └─────────────┘  (reopen hook per tick)         │
//!                 └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use admin_sidecar::config::{load_config, validate_config, ConfigError, SidecarConfig};
use admin_sidecar::observability::{init_logging, init_metrics};
use admin_sidecar::Sidecar;

#[derive(Parser)]
#[command(name = "admin-sidecar")]
#[command(about = "Runs a server process with an admin port and log rotation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra arguments appended to the process command line.
    #[arg(last = true)]
    process_args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("admin-sidecar: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "admin-sidecar failed");
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<SidecarConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = SidecarConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };
    config.process.args.extend(cli.process_args.iter().cloned());
    Ok(config)
}

async fn run(config: SidecarConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config.observability);

    tracing::info!("admin-sidecar v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        admin_address = %config.admin.listen_address(),
        command = %config.process.command,
        log_paths = ?config.process.log_paths,
        rotation_frequency_secs = config.rotation.frequency_secs,
        rotation_keep = config.rotation.keep,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let outcome = Sidecar::new(config).run().await?;
    if outcome.is_failure() {
        return Err(outcome.to_string().into());
    }

    tracing::info!(outcome = %outcome, "Shutdown complete");
    Ok(())
}
