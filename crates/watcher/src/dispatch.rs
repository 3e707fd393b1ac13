//! Event dispatch
//!
//! Each notification ends in one of two states: `Ignored` (not about a
//! profile directory) or `Routed` to the profile's lane. Whether a deleted
//! entry was a directory cannot be asked of the filesystem after the fact,
//! so it comes from the notification itself or from a cache of directories
//! seen before they disappeared.

use crate::lanes::Lanes;
use crate::pipeline::{ProfileOp, ProfilePipeline};
use crate::{EventKind, WatchEvent};
use parking_lot::RwLock;
use savevault_core::{Error, Profile, Result};
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a notification was not routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Path is not below the watched root
    OutsideRoot,
    /// Event on the root directory itself
    Root,
    /// The entry is (or was) not a directory
    NotADirectory,
    /// Directory-ness could not be determined
    Unclassified,
}

/// Outcome of classifying one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Ignored(IgnoreReason),
    Routed(ProfileOp),
}

/// Profile directories known to exist, remembered so that their deletion
/// can be recognised once they are gone
#[derive(Debug, Default)]
pub struct DirectoryCache {
    known: RwLock<HashSet<PathBuf>>,
}

impl DirectoryCache {
    /// Cache seeded with every directory currently directly under `root`
    pub fn seed(root: &Path) -> Result<Self> {
        let io_err = |source: io::Error| Error::Io {
            path: root.to_path_buf(),
            source,
        };

        let mut known = HashSet::new();
        for entry in std::fs::read_dir(root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_dir() {
                known.insert(entry.path());
            }
        }

        debug!(root = %root.display(), profiles = known.len(), "seeded directory cache");
        Ok(Self {
            known: RwLock::new(known),
        })
    }

    pub fn remember(&self, path: &Path) {
        if !self.known.read().contains(path) {
            self.known.write().insert(path.to_path_buf());
        }
    }

    /// Drop `path`, returning whether it was known
    pub fn forget(&self, path: &Path) -> bool {
        self.known.write().remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.known.read().contains(path)
    }

    pub fn len(&self) -> usize {
        self.known.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.read().is_empty()
    }
}

/// Routes notifications for the watched root to profile lanes
pub struct Dispatcher {
    root: PathBuf,
    cache: DirectoryCache,
    lanes: Lanes,
}

impl Dispatcher {
    /// Create a dispatcher, scanning the root for existing profiles
    pub fn new(pipeline: Arc<ProfilePipeline>) -> Result<Self> {
        let root = pipeline.config().root.clone();
        let cache = DirectoryCache::seed(&root)?;
        Ok(Self {
            root,
            cache,
            lanes: Lanes::new(pipeline),
        })
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Decide what a notification means, without acting on it
    pub fn classify(&self, event: &WatchEvent) -> Result<Disposition> {
        let Ok(relative) = event.path.strip_prefix(&self.root) else {
            return Ok(Disposition::Ignored(IgnoreReason::OutsideRoot));
        };

        let mut components = relative.components();
        let name = match components.next() {
            None => return Ok(Disposition::Ignored(IgnoreReason::Root)),
            Some(Component::Normal(name)) => name,
            Some(_) => return Ok(Disposition::Ignored(IgnoreReason::OutsideRoot)),
        };
        let top_level = components.next().is_none();
        let profile_path = self.root.join(name);

        if event.kind == EventKind::Deleted && top_level {
            let known = self.cache.forget(&profile_path);
            let was_dir = event.is_dir.unwrap_or(known);
            if !was_dir {
                return Ok(Disposition::Ignored(IgnoreReason::NotADirectory));
            }
            return Ok(routed(ProfileOp::Cascade, profile_path));
        }

        // Anything else below a profile is a change to that profile
        match std::fs::metadata(&profile_path) {
            Ok(metadata) if metadata.is_dir() => {
                self.cache.remember(&profile_path);
                Ok(routed(ProfileOp::Archive, profile_path))
            }
            Ok(_) => Ok(Disposition::Ignored(IgnoreReason::NotADirectory)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Disposition::Ignored(IgnoreReason::NotADirectory))
            }
            Err(e) => Err(Error::NotificationFilter {
                path: event.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Classify `event` and queue the resulting work
    pub async fn dispatch(&self, event: WatchEvent) -> Disposition {
        let disposition = match self.classify(&event) {
            Ok(disposition) => disposition,
            Err(e) => {
                warn!(error = %e, "ignoring notification");
                Disposition::Ignored(IgnoreReason::Unclassified)
            }
        };

        match &disposition {
            Disposition::Ignored(reason) => {
                debug!(path = %event.path.display(), kind = ?event.kind, ?reason, "notification ignored");
            }
            Disposition::Routed(op) => {
                debug!(path = %event.path.display(), ?op, "notification routed");
                self.lanes.submit(op.clone()).await;
            }
        }

        disposition
    }

    /// Consume notifications until the channel closes, then drain the lanes
    pub async fn run(self, mut rx: mpsc::Receiver<WatchEvent>) {
        info!(root = %self.root.display(), profiles = self.cache.len(), "dispatcher started");

        while let Some(event) = rx.recv().await {
            self.dispatch(event).await;
        }

        info!("notification stream closed, finishing queued work");
        self.shutdown().await;
    }

    /// Wait until all routed work so far has completed
    pub async fn settle(&self) {
        self.lanes.settle().await;
    }

    pub async fn shutdown(self) {
        self.lanes.shutdown().await;
    }
}

fn routed(op: fn(Profile) -> ProfileOp, path: PathBuf) -> Disposition {
    match Profile::from_path(path) {
        Some(profile) => Disposition::Routed(op(profile)),
        None => Disposition::Ignored(IgnoreReason::OutsideRoot),
    }
}
