//! Agent lifecycle: lock the root, watch, dispatch, stop on Ctrl-C

use crate::locks::RootLock;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use savevault_core::{SystemClock, VaultConfig};
use savevault_watcher::{Dispatcher, EventSource, ProfilePipeline};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Run the agent in the foreground until interrupted
pub async fn run(config: VaultConfig) -> Result<()> {
    let lock = RootLock::acquire(&config.root)?;
    let config = Arc::new(config);

    info!(
        root = %config.root.display(),
        interval = %config.granularity,
        limit = config.retention_limit,
        match_rule = ?config.match_rule,
        debounce_ms = config.debounce_ms,
        "savevault agent starting"
    );

    let pipeline = Arc::new(ProfilePipeline::new(Arc::clone(&config), Arc::new(SystemClock)));
    let dispatcher = Dispatcher::new(pipeline).context("Failed to scan watched root")?;

    let (tx, rx) = mpsc::channel(config.event_buffer);
    let source = EventSource::start(&config.root, tx).context("Failed to start file watcher")?;
    let dispatching = tokio::spawn(dispatcher.run(rx));

    println!(
        "{} {}",
        "Watching".green().bold(),
        config.root.display().to_string().cyan()
    );
    println!("{}", "Press Ctrl-C to stop".dimmed());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("interrupt received, shutting down");

    // Closing the source ends the notification stream; queued work finishes
    drop(source);
    dispatching.await.context("Dispatcher task failed")?;

    lock.release()?;
    info!("savevault agent stopped");
    Ok(())
}
