//! iasync CLI
//!
//! Command-line interface for running incremental syncs and inspecting
//! their state. Meant to be run from a scheduler; each `run` picks up only
//! the items updated since the last successful run.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use iasync_archive::{ArchiveClient, ArchiveOptions};
use iasync_core::{
    FileClassifier, ProgressStore, SnapshotStore, SyncConfig, SyncEngine, SyncReport, Timestamp,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iasync")]
#[command(about = "iasync - Incremental file metadata harvester for Internet Archive collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one incremental sync pass
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Collection to harvest (overrides the config file)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Show the last attempt and last success
    Status {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show how file names are classified
    Classify {
        #[command(flatten)]
        config: ConfigArgs,

        /// File names to classify
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Config file (default: <config dir>/iasync/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SyncConfig::load(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }

        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Log timestamps are UTC (RFC 3339)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, collection } => cmd_run(&config, collection).await,
        Commands::Status { config } => cmd_status(&config).await,
        Commands::Classify { config, names } => cmd_classify(&config, &names),
    }
}

async fn cmd_run(args: &ConfigArgs, collection: Option<String>) -> Result<()> {
    let mut config = args.load()?;
    if let Some(collection) = collection {
        config.collection = collection;
    }

    config
        .ensure_dirs()
        .context("Failed to create data directories")?;

    let client = ArchiveClient::new(ArchiveOptions::from_config(&config.archive))
        .context("Failed to create archive client")?;
    let engine =
        SyncEngine::new(&config, Arc::new(client)).context("Invalid sync configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        collection = %config.collection,
        "Starting sync"
    );

    let report = engine.run().await.context("Sync failed")?;
    print_report(&report);

    Ok(())
}

async fn cmd_status(args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;

    let record = ProgressStore::new(config.progress_path())
        .read()
        .await
        .context("Failed to read progress file")?;
    let snapshots = SnapshotStore::new(config.items_dir())
        .count()
        .await
        .context("Failed to count snapshots")?;

    println!("Data directory: {}", config.data_dir.display());
    println!("  Last attempt:  {}", format_timestamp(record.last_attempt.as_ref()));
    println!("  Last success:  {}", format_timestamp(record.last_success.as_ref()));
    if record.is_pending() {
        println!("  State:         last attempt did not complete");
    } else if record.last_success.is_some() {
        println!("  State:         up to date as of last success");
    } else {
        println!("  State:         never synced");
    }
    println!("  Snapshots:     {}", snapshots);

    Ok(())
}

fn cmd_classify(args: &ConfigArgs, names: &[String]) -> Result<()> {
    let config = args.load()?;
    let classifier =
        FileClassifier::with_pattern(&config.file_pattern).context("Invalid file pattern")?;

    for name in names {
        println!("{:<10} {}", classifier.classify(name).as_str(), name);
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("✓ Sync complete ({})", report.started);
    println!("  Query:       {}", report.query);
    println!("  Items:       {}", report.items);
    println!("  Entries:     {}", report.entries);
    println!("  Ignored:     {}", report.ignored);
    println!("  Unexpected:  {}", report.unexpected);
    println!("  Diagnostics: {}", report.diagnostics);
    println!("  Duration:    {}", format_duration(report.duration_ms));
}

fn format_timestamp(value: Option<&Timestamp>) -> &str {
    value.map(Timestamp::as_str).unwrap_or("never")
}

fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    if secs < 1 {
        format!("{}ms", ms)
    } else if secs < 60 {
        format!("{}.{}s", secs, (ms % 1000) / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
