//! BTP Monitor CLI - read-only inspection of a monitor state store

use anyhow::{bail, Context, Result};
use btp_monitor::{LogKind, MonitorDb, StoreConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "btp-monitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the database file
    #[arg(short, long, default_value = "./monitor.db")]
    db_path: PathBuf,

    /// JSON store configuration. Its `path` overrides --db-path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database information and table counts
    Status,

    /// List every stored link with its state
    Links,

    /// Show pending transactions of one link
    Txs {
        /// Source network id (`authority-path` or `btp://` address)
        src: String,

        /// Destination network id (`authority-path` or `btp://` address)
        dst: String,
    },

    /// Show the event log
    Logs {
        /// Kinds to include (repeatable). Defaults to every kind.
        #[arg(short, long = "kind")]
        kinds: Vec<LogKind>,

        /// Only entries for this source label
        #[arg(long)]
        src: Option<String>,

        /// Only entries for this destination label
        #[arg(long)]
        dst: Option<String>,

        /// Return at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Resolve the store configuration, refusing to create a missing database
fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::new(&cli.db_path),
    };
    let path = config.path.get_or_insert_with(|| cli.db_path.clone());

    if !path.exists() {
        bail!("Database not found: {}", path.display());
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = store_config(&cli)?;
    let db = MonitorDb::open_with_config(config).context("Failed to open database")?;

    // Execute command
    match cli.command {
        Commands::Status => commands::status::execute(&db)?,
        Commands::Links => commands::links::execute(&db)?,
        Commands::Txs { src, dst } => commands::txs::execute(&db, &src, &dst)?,
        Commands::Logs {
            kinds,
            src,
            dst,
            limit,
        } => commands::logs::execute(&db, kinds, src, dst, limit)?,
    }

    Ok(())
}
