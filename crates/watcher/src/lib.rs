//! File system watching for savevault
//!
//! This crate turns change notifications under the watched root into
//! archive and cleanup work:
//! - notify-backed event source feeding a bounded channel
//! - Dispatcher that filters notifications down to profile directories
//! - Per-profile lanes so work on one profile never overlaps
//! - Optional coalescing of change bursts

pub mod dispatch;
pub mod lanes;
pub mod pipeline;
pub mod source;

pub use dispatch::{DirectoryCache, Dispatcher, Disposition, IgnoreReason};
pub use lanes::Lanes;
pub use pipeline::{ChangeOutcome, ProfileOp, ProfilePipeline};
pub use source::EventSource;

use std::path::PathBuf;

/// File system event, reduced to what the dispatcher needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
    /// Whether the entry was a directory, when the backend says so
    pub is_dir: Option<bool>,
}

impl WatchEvent {
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EventKind::Changed,
            is_dir: None,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EventKind::Deleted,
            is_dir: None,
        }
    }

    pub fn with_is_dir(mut self, is_dir: Option<bool>) -> Self {
        self.is_dir = is_dir;
        self
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Entry created or modified
    Changed,
    /// Entry removed or moved away
    Deleted,
}
