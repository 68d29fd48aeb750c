use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use envault::cli::{handle_backup_command, handle_restore_command, handle_scan_command};
use envault::config::load_config;

#[derive(Parser)]
#[command(
    name = "envault",
    version,
    about = "Backup and restore direnv .envrc files with optional GPG encryption"
)]
struct Cli {
    /// Path to the config file (ENVAULT_CONFIG takes priority if set)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up all discovered .envrc files
    Backup,

    /// Restore the most recent backup
    Restore,

    /// List the .envrc files a backup would include
    Scan {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Backup => handle_backup_command(&config)?,
        Commands::Restore => handle_restore_command(&config)?,
        Commands::Scan { json } => handle_scan_command(&config, json)?,
    }

    Ok(())
}

/// Initialize logging; RUST_LOG overrides the --verbose default
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
