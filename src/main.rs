//! Sync Agent - Main entry point
//!
//! One-way periodic folder synchronization with journaled operations.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sync_agent::config::Config;
use sync_agent::daemon::ShutdownCoordinator;
use sync_agent::fs::LocalFs;
use sync_agent::journal::{EventKind, EventSink, LogEvent, SyncJournal};
use sync_agent::sync::scheduler::Scheduler;
use sync_agent::sync::SyncEngine;
use sync_agent::utils;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source folder path (overrides config)
    #[arg(short, long)]
    source_folder: Option<PathBuf>,

    /// Replica folder path (overrides config)
    #[arg(short, long)]
    replica_folder: Option<PathBuf>,

    /// Log folder path (overrides config)
    #[arg(short, long)]
    log_folder: Option<PathBuf>,

    /// Synchronization interval in seconds (overrides config)
    #[arg(short = 'i', long)]
    sync_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration, then apply CLI overrides
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    if let Some(path) = args.source_folder {
        config.sync.source_folder = path;
    }
    if let Some(path) = args.replica_folder {
        config.sync.replica_folder = path;
    }
    if let Some(path) = args.log_folder {
        config.log.folder = path;
    }
    if let Some(interval) = args.sync_interval {
        config.sync.interval_secs = interval;
    }

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!(
        "Starting sync-agent v{} ({} -> {})",
        env!("CARGO_PKG_VERSION"),
        config.sync.source_folder.display(),
        config.sync.replica_folder.display()
    );

    config.validate()?;

    // The journal lives in the log folder; create both before anything else
    // so startup validation itself gets journaled.
    std::fs::create_dir_all(&config.log.folder).with_context(|| {
        format!(
            "failed to create log folder {}",
            config.log.folder.display()
        )
    })?;
    let journal = Arc::new(SyncJournal::create(&config.log.folder)?);
    journal.emit(&LogEvent::new(
        EventKind::Created,
        format!("Log file was created: {}", journal.path().display()),
    ));

    ensure_folders(&config, journal.as_ref())?;
    journal.emit(&LogEvent::new(
        EventKind::Okay,
        "All given folders exist and have necessary permissions.",
    ));
    journal.emit(&LogEvent::new(
        EventKind::Info,
        format!(
            "Starting synchronization with intervals of {} seconds",
            config.sync.interval_secs
        ),
    ));

    // Wire the pipeline: local filesystem, one engine, one scheduler
    let engine = Arc::new(SyncEngine::new(
        Arc::new(LocalFs),
        config.sync.source_folder.clone(),
        config.sync.replica_folder.clone(),
        journal.clone() as Arc<dyn EventSink>,
    ));

    let coordinator = ShutdownCoordinator::new();
    let scheduler = Scheduler::new(engine, config.interval(), coordinator.token());
    let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

    // Wait for shutdown signal
    coordinator.wait_for_signal().await;
    journal.emit(&LogEvent::new(
        EventKind::Info,
        "Synchronization interrupted by user. Exiting...",
    ));

    // Let an in-flight cycle finish (with timeout)
    match tokio::time::timeout(Duration::from_secs(30), scheduler_handle).await {
        Ok(Ok(())) => tracing::info!("Scheduler shutdown complete"),
        Ok(Err(e)) => tracing::error!("Scheduler task panicked: {}", e),
        Err(_) => tracing::warn!("Scheduler shutdown timeout, forcing exit"),
    }

    Ok(())
}

/// Verify the source folder and prepare the replica folder, journaling the
/// outcome of each check. A missing source folder is a configuration error
/// and aborts startup; a missing replica folder is created.
fn ensure_folders(config: &Config, journal: &dyn EventSink) -> Result<()> {
    let source = &config.sync.source_folder;
    if !source.is_dir() {
        journal.emit(&LogEvent::new(
            EventKind::Error,
            format!(
                "Source folder does not exist or is not a directory: {}",
                source.display()
            ),
        ));
        bail!("source folder unavailable: {}", source.display());
    }
    journal.emit(&LogEvent::new(
        EventKind::Okay,
        format!(
            "Source folder exists and has necessary permissions: {}",
            source.display()
        ),
    ));

    let replica = &config.sync.replica_folder;
    if !replica.exists() {
        std::fs::create_dir_all(replica).with_context(|| {
            format!("failed to create replica folder {}", replica.display())
        })?;
        journal.emit(&LogEvent::new(
            EventKind::Created,
            format!("Replica folder was created: {}", replica.display()),
        ));
    }
    journal.emit(&LogEvent::new(
        EventKind::Okay,
        format!(
            "Replica folder exists and has necessary permissions: {}",
            replica.display()
        ),
    ));

    Ok(())
}
