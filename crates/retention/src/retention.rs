//! Retention enforcement
//!
//! Runs once after every new archive. When a profile owns more files than
//! the limit allows, exactly one is deleted: the most recently created one.
//! Repeated events are what converge the count back toward the limit.

use crate::listing::{list_files, ArchiveEntry};
use savevault_core::config::DEFAULT_RETENTION_LIMIT;
use savevault_core::{Error, MatchRule, Profile, Result, VaultConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Retention policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Archives allowed per profile (default: 10)
    pub limit: usize,
    /// Which root-level files count toward a profile
    pub rule: MatchRule,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETENTION_LIMIT,
            rule: MatchRule::default(),
        }
    }
}

/// An archive removed to bring a profile back under its limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub path: PathBuf,
    /// Files owned by the profile before the deletion
    pub count: usize,
    pub limit: usize,
}

/// Pick the file to evict, if the profile is over its limit
///
/// Candidates are ordered by creation time, newest first, and the first one
/// is chosen. Equal timestamps fall back to path order, which for archives of
/// one profile is bucket order.
pub fn select_eviction(entries: &[ArchiveEntry], limit: usize) -> Option<&ArchiveEntry> {
    if entries.len() <= limit {
        return None;
    }

    entries
        .iter()
        .max_by(|a, b| a.created.cmp(&b.created).then_with(|| a.path.cmp(&b.path)))
}

/// Keeps each profile's archive count in check
#[derive(Debug, Clone)]
pub struct RetentionEnforcer {
    root: PathBuf,
    policy: RetentionPolicy,
}

impl RetentionEnforcer {
    /// Create a new enforcer over `root` with the given policy
    pub fn new(root: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(
            &config.root,
            RetentionPolicy {
                limit: config.retention_limit,
                rule: config.match_rule,
            },
        )
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Archives currently counted against `profile`
    pub fn owned(&self, profile: &Profile) -> Result<Vec<ArchiveEntry>> {
        let rule = self.policy.rule;
        list_files(&self.root, |path: &Path| rule.counts_toward(profile.path(), path))
    }

    /// Delete at most one archive if `profile` is over its limit
    pub fn enforce(&self, profile: &Profile) -> Result<Option<Eviction>> {
        let entries = self.owned(profile)?;
        self.evict(profile, &entries)
    }

    fn evict(&self, profile: &Profile, entries: &[ArchiveEntry]) -> Result<Option<Eviction>> {
        let limit = self.policy.limit;

        let Some(victim) = select_eviction(entries, limit) else {
            debug!(profile = %profile.name(), count = entries.len(), limit, "within retention limit");
            return Ok(None);
        };

        std::fs::remove_file(&victim.path).map_err(|source| Error::Deletion {
            path: victim.path.clone(),
            source,
        })?;

        info!(
            profile = %profile.name(),
            deleted = %victim.path.display(),
            count = entries.len(),
            limit,
            "archive count over limit, deleted most recent archive"
        );

        Ok(Some(Eviction {
            path: victim.path.clone(),
            count: entries.len(),
            limit,
        }))
    }
}
