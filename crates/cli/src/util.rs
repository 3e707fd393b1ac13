//! Shared utilities for CLI commands

use crate::SettingsArgs;
use anyhow::{Context, Result};
use savevault_core::config::WatchSettings;
use savevault_core::VaultConfig;
use std::path::PathBuf;
use std::time::SystemTime;

/// Default watched root: the roaming application-data directory's EldenRing folder
pub fn default_root() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("EldenRing"))
        .context("Could not determine the platform config directory; pass a root path")
}

/// Build the validated configuration from the config file and flags
pub fn load_config(args: &SettingsArgs) -> Result<VaultConfig> {
    let file = match &args.config {
        Some(path) => WatchSettings::load(path)?,
        None => WatchSettings::default(),
    };

    let flags = WatchSettings {
        root: args.root.clone(),
        interval: args.interval,
        limit: args.limit,
        match_rule: args.match_rule,
        debounce_ms: args.debounce_ms,
        event_buffer: args.event_buffer,
    };

    let merged = file.merge(flags);
    let default_root = match &merged.root {
        Some(root) => root.clone(),
        None => default_root()?,
    };
    let mut config = merged.resolve(default_root)?;

    // Notification paths are absolute and symlink-free
    config.root = config
        .root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", config.root.display()))?;

    Ok(config)
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(time: SystemTime) -> String {
    if let Ok(elapsed) = SystemTime::now().duration_since(time) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else if seconds < 604800 {
            format!("{} days ago", seconds / 86400)
        } else {
            format!("{} weeks ago", seconds / 604800)
        }
    } else {
        "in the future".to_string()
    }
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
