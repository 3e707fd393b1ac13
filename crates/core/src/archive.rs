//! Zip archiving of profile directories
//!
//! Archives are written to a hidden temporary file next to the target and
//! renamed into place once complete. A failed write leaves neither a partial
//! archive nor a stray temporary file behind.

use crate::error::{Error, Result};
use crate::naming::Profile;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name prefix of in-flight archives
pub const TEMP_PREFIX: &str = ".svault-";

/// Entries above this size need zip64 records
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Outcome of a successful archive write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    /// Archive path that now exists
    pub path: PathBuf,
    /// Whether an archive for the same bucket was replaced
    pub replaced: bool,
    /// Regular files stored
    pub files: usize,
    /// Uncompressed bytes stored
    pub bytes: u64,
}

/// Writes profile directories into zip archives
#[derive(Clone, Copy)]
pub struct Archiver {
    options: FileOptions,
}

impl fmt::Debug for Archiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archiver").finish_non_exhaustive()
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver {
    pub fn new() -> Self {
        Self {
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Archive `profile` into `target`, replacing any archive already there
    pub fn archive(&self, profile: &Profile, target: &Path) -> Result<ArchiveReceipt> {
        let source = profile.path();
        let fail = |e: io::Error| Error::archive_write(source, target, e);

        if !source.is_dir() {
            return Err(fail(io::Error::new(
                io::ErrorKind::NotFound,
                "profile directory does not exist",
            )));
        }

        // Same bucket: the new snapshot replaces the old one, it never merges
        let replaced = match fs::remove_file(target) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(fail(e)),
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(fail)?;

        // tmp is removed on drop if anything below fails
        let (files, bytes) = write_zip(source, tmp.as_file_mut(), self.options).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;
        tmp.persist(target).map_err(|e| fail(e.error))?;

        info!(
            profile = %profile.name(),
            archive = %target.display(),
            bucket = profile.bucket_of(target).unwrap_or("-"),
            files,
            bytes,
            replaced,
            "profile changed, archive written"
        );

        Ok(ArchiveReceipt {
            path: target.to_path_buf(),
            replaced,
            files,
            bytes,
        })
    }
}

fn write_zip<W: Write + Seek>(source: &Path, writer: W, options: FileOptions) -> io::Result<(usize, u64)> {
    let mut zip = ZipWriter::new(writer);
    let mut files = 0usize;
    let mut bytes = 0u64;

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options).map_err(zip_err)?;
        } else if entry.file_type().is_file() {
            let len = entry.metadata()?.len();
            zip.start_file(name, options.large_file(len >= ZIP64_THRESHOLD))
                .map_err(zip_err)?;
            let mut file = File::open(entry.path())?;
            bytes += io::copy(&mut file, &mut zip)?;
            files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    zip.finish().map_err(zip_err)?;
    Ok((files, bytes))
}

/// Zip entry names are relative and always `/`-separated
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn zip_err(e: ZipError) -> io::Error {
    match e {
        ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn profile_with_save(root: &Path, name: &str, contents: &[u8]) -> Profile {
        let profile = Profile::new(root, name);
        fs::create_dir_all(profile.path().join("backup")).unwrap();
        fs::write(profile.path().join("ER0000.sl2"), contents).unwrap();
        fs::write(profile.path().join("backup/ER0000.sl2.bak"), b"old").unwrap();
        profile
    }

    fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        buf
    }

    fn temp_files(root: &Path) -> usize {
        fs::read_dir(root)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(TEMP_PREFIX)
            })
            .count()
    }

    #[test]
    fn test_archive_contains_full_tree() {
        let temp_dir = TempDir::new().unwrap();
        let profile = profile_with_save(temp_dir.path(), "12345", b"save data");
        fs::create_dir(profile.path().join("empty")).unwrap();
        let target = temp_dir.path().join("12345_2024-03-01-10.zip");

        let receipt = Archiver::new().archive(&profile, &target).unwrap();

        assert!(!receipt.replaced);
        assert_eq!(receipt.files, 2);
        assert_eq!(receipt.bytes, 12);
        assert_eq!(read_entry(&target, "ER0000.sl2"), b"save data");
        assert_eq!(read_entry(&target, "backup/ER0000.sl2.bak"), b"old");

        let zip = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        assert!(zip.file_names().any(|n| n == "empty/"));
        assert_eq!(temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_same_bucket_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let profile = profile_with_save(temp_dir.path(), "12345", b"first");
        let target = temp_dir.path().join("12345_2024-03-01-10.zip");
        let archiver = Archiver::new();

        archiver.archive(&profile, &target).unwrap();
        fs::write(profile.path().join("ER0000.sl2"), b"second").unwrap();
        let receipt = archiver.archive(&profile, &target).unwrap();

        assert!(receipt.replaced);
        assert_eq!(read_entry(&target, "ER0000.sl2"), b"second");
    }

    #[test]
    fn test_missing_profile_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let profile = Profile::new(temp_dir.path(), "gone");
        let target = temp_dir.path().join("gone_2024-03-01-10.zip");

        let err = Archiver::new().archive(&profile, &target).unwrap_err();

        assert!(matches!(err, Error::ArchiveWrite { .. }));
        assert!(!target.exists());
        assert_eq!(temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_unwritable_target_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let profile = profile_with_save(temp_dir.path(), "12345", b"data");
        // A non-empty directory in the way cannot be replaced
        let target = temp_dir.path().join("12345_2024-03-01-10.zip");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        assert!(Archiver::new().archive(&profile, &target).is_err());
        assert_eq!(temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_archiver_debug() {
        assert_eq!(format!("{:?}", Archiver::new()), "Archiver { .. }");
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let rel: PathBuf = ["a", "b", "c.sl2"].iter().collect();
        assert_eq!(entry_name(&rel), "a/b/c.sl2");
    }
}
