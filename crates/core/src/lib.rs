//! savevault core - archive naming, archive writing and configuration
//!
//! This crate provides the building blocks the watcher pipeline is made of:
//! - Bucket labels and canonical archive paths
//! - Zip archiving with write-then-rename discipline
//! - Immutable agent configuration
//! - Error taxonomy shared by every savevault crate

pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod naming;

// Re-export main types for convenience
pub use archive::{ArchiveReceipt, Archiver};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Granularity, VaultConfig};
pub use error::{Error, Result};
pub use naming::{archive_path, bucket_label, MatchRule, Profile};
