//! Per-profile work: archive then enforce retention, or cascade delete

use savevault_core::{Archiver, ArchiveReceipt, Clock, Profile, Result, VaultConfig};
use savevault_retention::{CascadeDeleter, CascadeReport, Eviction, RetentionEnforcer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Work routed to a profile lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOp {
    /// The profile directory changed: archive it and enforce retention
    Archive(Profile),
    /// The profile directory was removed: delete its archives
    Cascade(Profile),
}

impl ProfileOp {
    pub fn profile(&self) -> &Profile {
        match self {
            ProfileOp::Archive(p) | ProfileOp::Cascade(p) => p,
        }
    }
}

/// Result of handling one change
#[derive(Debug)]
pub struct ChangeOutcome {
    pub receipt: ArchiveReceipt,
    pub eviction: Option<Eviction>,
}

/// Archiver, retention enforcer and cascade deleter wired to one config
pub struct ProfilePipeline {
    config: Arc<VaultConfig>,
    clock: Arc<dyn Clock>,
    archiver: Archiver,
    retention: RetentionEnforcer,
    cascade: CascadeDeleter,
}

impl ProfilePipeline {
    pub fn new(config: Arc<VaultConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            archiver: Archiver::new(),
            retention: RetentionEnforcer::from_config(&config),
            cascade: CascadeDeleter::from_config(&config),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Archive `profile` into the current bucket, then enforce retention
    ///
    /// A retention failure is logged and reported as no eviction; the new
    /// archive stays.
    pub fn on_changed(&self, profile: &Profile) -> Result<ChangeOutcome> {
        let now = self.clock.now();
        let target = profile.archive_path(&now, self.config.granularity);
        debug!(profile = %profile.name(), archive = %target.display(), "archiving profile");

        let receipt = self.archiver.archive(profile, &target)?;

        let eviction = match self.retention.enforce(profile) {
            Ok(eviction) => eviction,
            Err(e) => {
                warn!(profile = %profile.name(), error = %e, "retention enforcement failed");
                None
            }
        };

        Ok(ChangeOutcome { receipt, eviction })
    }

    /// Remove every archive of a deleted profile
    pub fn on_deleted(&self, profile: &Profile) -> Result<CascadeReport> {
        self.cascade.cascade_delete(profile)
    }

    /// Run `op`, logging instead of propagating failures
    pub fn run(&self, op: &ProfileOp) {
        let result = match op {
            ProfileOp::Archive(profile) => self.on_changed(profile).map(drop),
            ProfileOp::Cascade(profile) => self.on_deleted(profile).map(drop),
        };

        if let Err(e) = result {
            warn!(profile = %op.profile().name(), error = %e, "profile operation failed, still watching");
        }
    }
}
