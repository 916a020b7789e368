//! testrelay CLI — the main entry point.
//!
//! Commands:
//! - `check`  — Validate and compile a stage settings document
//! - `replay` — Drive a recorded lifecycle event stream through the pipeline

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "testrelay",
    about = "testrelay — forward test lifecycle events to Fluentd-compatible collectors",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a stage settings document and print the compiled table
    Check {
        #[command(flatten)]
        relay: commands::RelayArgs,
    },

    /// Replay a recorded lifecycle event stream through the pipeline
    Replay {
        #[command(flatten)]
        relay: commands::RelayArgs,

        /// Path to the event stream (one JSON lifecycle event per line)
        events: PathBuf,

        /// Print records to stdout instead of transmitting
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };

    match cli.command {
        Commands::Check { relay } => {
            commands::init_tracing(level);
            commands::check::run(&relay)?;
        }
        Commands::Replay {
            relay,
            events,
            dry_run,
        } => {
            // replay installs its own subscriber so the log bridge can be
            // layered in when --extend-logging is set
            commands::replay::run(&relay, &events, dry_run, level).await?;
        }
    }

    Ok(())
}
