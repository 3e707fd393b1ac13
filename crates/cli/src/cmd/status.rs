//! Show profiles and their archives

use crate::locks::RootLock;
use crate::{util, SettingsArgs};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use savevault_core::Profile;
use savevault_retention::{ArchiveEntry, RetentionEnforcer};
use std::cmp::Reverse;

pub async fn run(settings: &SettingsArgs) -> Result<()> {
    // 1. Resolve configuration
    let config = util::load_config(settings)?;
    let enforcer = RetentionEnforcer::from_config(&config);

    // 2. Collect profile directories
    let mut profiles = Vec::new();
    for entry in std::fs::read_dir(&config.root)
        .with_context(|| format!("Failed to read {}", config.root.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            profiles.push(Profile::new(
                &config.root,
                entry.file_name().to_string_lossy().into_owned(),
            ));
        }
    }
    profiles.sort_by(|a, b| a.name().cmp(b.name()));

    // 3. Display output
    println!("{}", "Vault Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Root:      {}", config.root.display().to_string().cyan());
    print!("Agent:     ");
    if let Some(holder) = RootLock::holder(&config.root) {
        println!("{} (pid {})", "Watching ✓".green(), holder.pid);
    } else {
        println!("{}", "Not running".yellow());
    }
    println!("Interval:  {}", config.granularity);
    println!("Limit:     {} per profile", config.retention_limit);
    println!("Matching:  {:?}", config.match_rule);
    println!();

    if profiles.is_empty() {
        println!("{}", "No profiles found".dimmed());
        return Ok(());
    }

    for profile in &profiles {
        let mut archives = enforcer.owned(profile)?;
        archives.sort_by_key(|a: &ArchiveEntry| Reverse((a.created, a.path.clone())));

        let count = format!("({}/{})", archives.len(), config.retention_limit);
        if archives.len() > config.retention_limit {
            println!("{} {}", profile.name().yellow().bold(), count.red());
        } else {
            println!("{} {}", profile.name().yellow().bold(), count.dimmed());
        }

        for archive in &archives {
            let name = archive
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "  {}  {}  {}",
                name,
                util::format_size(archive.len).cyan(),
                util::format_relative_time(archive.created).dimmed()
            );
        }
    }

    Ok(())
}
