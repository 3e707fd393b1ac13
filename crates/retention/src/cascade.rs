//! Cascade deletion of a removed profile's archives

use crate::listing::{list_files, ArchiveEntry};
use savevault_core::{Error, MatchRule, Profile, Result, VaultConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a cascade pass removed and what it could not
#[derive(Debug, Default)]
pub struct CascadeReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<Error>,
}

impl CascadeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Removes every archive belonging to a deleted profile
#[derive(Debug, Clone)]
pub struct CascadeDeleter {
    root: PathBuf,
    rule: MatchRule,
}

impl CascadeDeleter {
    pub fn new(root: impl Into<PathBuf>, rule: MatchRule) -> Self {
        Self {
            root: root.into(),
            rule,
        }
    }

    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(&config.root, config.match_rule)
    }

    /// Delete all root-level files the match rule attributes to `profile`
    ///
    /// Individual deletion failures are logged and collected; the pass keeps
    /// going. Only a failure to list the root is returned as an error.
    pub fn cascade_delete(&self, profile: &Profile) -> Result<CascadeReport> {
        let rule = self.rule;
        let matches = list_files(&self.root, |path: &Path| rule.cascades_from(profile.path(), path))?;

        info!(
            profile = %profile.name(),
            archives = matches.len(),
            "profile directory deleted, removing its archives"
        );

        Ok(delete_all(profile, matches))
    }
}

fn delete_all(profile: &Profile, matches: Vec<ArchiveEntry>) -> CascadeReport {
    let mut report = CascadeReport::default();
    for entry in matches {
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                info!(profile = %profile.name(), deleted = %entry.path.display(), "archive deleted");
                report.deleted.push(entry.path);
            }
            Err(source) => {
                warn!(
                    profile = %profile.name(),
                    path = %entry.path.display(),
                    error = %source,
                    "failed to delete archive"
                );
                report.failed.push(Error::Deletion {
                    path: entry.path,
                    source,
                });
            }
        }
    }

    report
}
