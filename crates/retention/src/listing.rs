//! Root-level archive listing
//!
//! There is no metadata database: the files sitting in the watched root,
//! with their creation timestamps, are the whole persisted state.

use savevault_core::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file directly under the watched root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    /// Creation time, or modification time where the platform has no birth time
    pub created: SystemTime,
    pub len: u64,
}

/// List regular files directly under `root` accepted by `filter`
///
/// Subdirectories are never descended into. Files that vanish while the
/// listing runs are skipped.
pub fn list_files<F>(root: &Path, mut filter: F) -> Result<Vec<ArchiveEntry>>
where
    F: FnMut(&Path) -> bool,
{
    let io_err = |source: io::Error| Error::Io {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(root).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !filter(&path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(io_err(e)),
        };
        if !metadata.is_file() {
            continue;
        }

        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(io_err)?;

        entries.push(ArchiveEntry {
            path,
            created,
            len: metadata.len(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_top_level_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("12345")).unwrap();
        fs::write(root.join("12345/ER0000.sl2"), b"nested").unwrap();
        fs::write(root.join("12345_2024-03-01-10.zip"), b"zip").unwrap();
        fs::write(root.join("notes.txt"), b"txt").unwrap();

        let mut paths: Vec<_> = list_files(root, |_| true)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        paths.sort();

        assert_eq!(
            paths,
            vec![root.join("12345_2024-03-01-10.zip"), root.join("notes.txt")]
        );
    }

    #[test]
    fn test_filter_applies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.zip"), b"12345").unwrap();
        fs::write(root.join("b.txt"), b"x").unwrap();

        let entries = list_files(root, |p| p.extension().is_some_and(|e| e == "zip")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].len, 5);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = list_files(&temp_dir.path().join("missing"), |_| true).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
