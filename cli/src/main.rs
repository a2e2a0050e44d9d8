//! Exambank command-line front end.
//!
//! Usage:
//!   exambank --db bank.db collections
//!   exambank --db bank.db add examiners '{"employee_id": 42, "name": "Ada"}'
//!   exambank --db bank.db export --out-dir backups
//!   exambank --db bank.db import backups/exambank-backup-20240101-120000.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exambank_cli::{commands, AppConfig, RelaunchHook};
use exambank_storage::Records;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "exambank")]
#[command(about = "Inspect, back up and restore an Exambank store")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    in_memory: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List collections and their record counts
    Collections,
    /// Print every record of a collection as JSON
    List { collection: String },
    /// Add a record given as a JSON object
    Add { collection: String, json: String },
    /// Write a snapshot of every collection
    Export {
        /// Directory for the snapshot file (defaults to the configured backup dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Replace store contents with a snapshot
    Import {
        file: PathBuf,
        /// Do not run the restart command afterwards
        #[arg(long)]
        no_restart: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.db, args.in_memory);
    let records = Records::open(&config.store).with_context(|| match &config.store.path {
        Some(path) => format!("failed to open store at {}", path.display()),
        None => "failed to open in-memory store".to_string(),
    })?;
    info!(store = %config.store.name, "store ready");

    let mut out = io::stdout().lock();
    match args.command {
        Command::Collections => commands::collections(&records, &mut out).await?,
        Command::List { collection } => commands::list(&records, &collection, &mut out).await?,
        Command::Add { collection, json } => {
            commands::add(&records, &collection, &json, &mut out).await?
        }
        Command::Export { out_dir } => {
            let dir = out_dir.unwrap_or_else(|| config.backup_dir.clone());
            commands::export(&records, &dir, &mut out).await?;
        }
        Command::Import { file, no_restart } => {
            let hook = RelaunchHook::new(config.restart_command.clone());
            let hook = (!no_restart).then_some(&hook as &dyn exambank_backup::RestartHook);
            commands::import(&records, &file, hook, &mut out).await?;
        }
    }
    Ok(())
}
