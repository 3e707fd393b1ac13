//! Error taxonomy for savevault

use std::path::PathBuf;

/// Errors raised by the archive pipeline
///
/// None of these are fatal to the watch loop: handlers log them and keep
/// watching. Only `Configuration` stops the agent, and only at startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid startup configuration (missing root, bad limit, bad config file)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Could not decide whether a notified path is a profile directory
    #[error("cannot classify notification for {path}: {reason}")]
    NotificationFilter { path: PathBuf, reason: String },

    /// Reading the profile or writing the archive failed
    #[error("failed to write archive {archive} for {profile}: {source}")]
    ArchiveWrite {
        profile: PathBuf,
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing an archive failed
    #[error("failed to delete {path}: {source}")]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The change-notification backend failed
    #[error("file watcher error: {0}")]
    Watch(String),

    /// Listing the watched root failed
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn archive_write(
        profile: impl Into<PathBuf>,
        archive: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::ArchiveWrite {
            profile: profile.into(),
            archive: archive.into(),
            source,
        }
    }
}

/// Result type used throughout savevault
pub type Result<T> = std::result::Result<T, Error>;
