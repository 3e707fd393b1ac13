//! Archive retention and cascade cleanup
//!
//! This crate provides:
//! - Listing of the archives a profile owns in the watched root
//! - Retention enforcement after each new archive
//! - Cascade deletion when a profile directory disappears

pub mod cascade;
pub mod listing;
pub mod retention;

// Re-exports
pub use cascade::{CascadeDeleter, CascadeReport};
pub use listing::{list_files, ArchiveEntry};
pub use retention::{select_eviction, Eviction, RetentionEnforcer, RetentionPolicy};
