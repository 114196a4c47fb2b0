//! CLI parser and dispatch to command-specific modules.

mod init;
mod reconcile;
mod score;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use autoverify::config::Settings;
use autoverify::logging;

#[derive(Parser)]
#[command(name = "autoverify")]
#[command(about = "OCR verification of inspection odometer and plate photos")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,

    /// Run one reconciliation pass over unprocessed inspections
    Run {
        /// Limit number of inspections to process
        #[arg(short, long)]
        limit: Option<usize>,
        /// Compute outcomes without writing to the database
        #[arg(long)]
        dry_run: bool,
        /// Number of inspections processed concurrently
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Run reconciliation passes repeatedly
    Daemon {
        /// Seconds to sleep between passes
        #[arg(short, long, default_value = "300")]
        interval: u64,
        /// Limit number of inspections per pass
        #[arg(short, long)]
        limit: Option<usize>,
        /// Number of inspections processed concurrently
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Score recognized text lines against a reference without OCR or database
    Score {
        /// Photo category: odometer or plate
        #[arg(long)]
        category: String,
        /// Reference value (odometer reading or plate number)
        #[arg(short, long)]
        reference: String,
        /// Match strategy (defaults to the configured one)
        #[arg(short, long)]
        strategy: Option<String>,
        /// Recognized lines, in reading order
        #[arg(required = true)]
        lines: Vec<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;

    // File logging only for commands that reconcile.
    let _guard = match cli.command {
        Commands::Run { .. } | Commands::Daemon { .. } => {
            Some(logging::init_with_file(&settings.log_dir, cli.verbose)?)
        }
        _ => {
            logging::init_console(cli.verbose);
            None
        }
    };

    if let Some(path) = &settings.config_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Run {
            limit,
            dry_run,
            workers,
        } => reconcile::cmd_run(&settings, limit, dry_run, workers).await,
        Commands::Daemon {
            interval,
            limit,
            workers,
        } => reconcile::cmd_daemon(&settings, interval, limit, workers).await,
        Commands::Score {
            category,
            reference,
            strategy,
            lines,
        } => score::cmd_score(&settings, &category, &reference, strategy.as_deref(), &lines),
    }
}
