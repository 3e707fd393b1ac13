//! Archive naming and ownership
//!
//! Archives live next to the profile directory they were taken from:
//!
//! ```text
//! <root>/
//!   12345/                      profile directory
//!   12345_2024-03-01-10.zip     hour bucket
//!   12345_2024-03-02-00.zip     day bucket (literal "-00")
//! ```

use crate::config::Granularity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Archive file extension, including the dot
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// One save profile: a directory directly under the watched root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    name: String,
    path: PathBuf,
}

impl Profile {
    /// Profile `name` under `root`
    pub fn new(root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: root.join(&name),
            name,
        }
    }

    /// Profile whose directory is `path`
    ///
    /// Returns `None` for paths without a final component (`/`, `..`).
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self { name, path })
    }

    /// Opaque profile identifier (e.g. a numeric account ID)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the profile directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive path for the bucket containing `now`
    pub fn archive_path(&self, now: &NaiveDateTime, granularity: Granularity) -> PathBuf {
        archive_path(&self.path, now, granularity)
    }

    /// Bucket label of `archive` if it is named `<name>_<bucket>.zip`
    pub fn bucket_of<'a>(&self, archive: &'a Path) -> Option<&'a str> {
        archive
            .file_name()?
            .to_str()?
            .strip_prefix(self.name.as_str())?
            .strip_prefix('_')?
            .strip_suffix(ARCHIVE_SUFFIX)
            .filter(|bucket| !bucket.is_empty())
    }
}

/// Label of the time bucket containing `now`
///
/// `Hour` yields `YYYY-MM-DD-HH`; `Day` yields `YYYY-MM-DD-00` so both
/// granularities sort and parse the same way.
pub fn bucket_label(now: &NaiveDateTime, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => now.format("%Y-%m-%d-%H").to_string(),
        Granularity::Day => format!("{}-00", now.format("%Y-%m-%d")),
    }
}

/// Canonical archive path: `<profile_path>_<bucket>.zip`
pub fn archive_path(profile_path: &Path, now: &NaiveDateTime, granularity: Granularity) -> PathBuf {
    let mut name = OsString::from(profile_path.as_os_str());
    name.push("_");
    name.push(bucket_label(now, granularity));
    name.push(ARCHIVE_SUFFIX);
    PathBuf::from(name)
}

/// Rule deciding which root-level files belong to a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRule {
    /// Textual matching on the full path.
    ///
    /// Retention counts every file whose path starts with the profile path;
    /// cascade deletes every file whose path contains it. Profile `6789`
    /// therefore also claims `67891_*.zip`.
    #[default]
    Legacy,
    /// Only `<profile>_*.zip` siblings of the profile directory
    Delimited,
}

impl MatchRule {
    /// Whether `candidate` counts toward `profile`'s retention quota
    pub fn counts_toward(self, profile: &Path, candidate: &Path) -> bool {
        match self {
            MatchRule::Legacy => candidate
                .to_string_lossy()
                .starts_with(profile.to_string_lossy().as_ref()),
            MatchRule::Delimited => is_delimited_archive(profile, candidate),
        }
    }

    /// Whether `candidate` is removed when `profile` is deleted
    pub fn cascades_from(self, profile: &Path, candidate: &Path) -> bool {
        match self {
            MatchRule::Legacy => candidate
                .to_string_lossy()
                .contains(profile.to_string_lossy().as_ref()),
            MatchRule::Delimited => is_delimited_archive(profile, candidate),
        }
    }
}

impl std::str::FromStr for MatchRule {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(MatchRule::Legacy),
            "delimited" => Ok(MatchRule::Delimited),
            other => Err(crate::Error::Configuration(format!(
                "unknown match rule '{}' (expected legacy or delimited)",
                other
            ))),
        }
    }
}

fn is_delimited_archive(profile: &Path, candidate: &Path) -> bool {
    let (Some(profile_name), Some(file_name)) = (profile.file_name(), candidate.file_name()) else {
        return false;
    };
    if candidate.parent() != profile.parent() {
        return false;
    }

    let profile_name = profile_name.to_string_lossy();
    let file_name = file_name.to_string_lossy();
    file_name
        .strip_prefix(profile_name.as_ref())
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| rest.len() > ARCHIVE_SUFFIX.len() && rest.ends_with(ARCHIVE_SUFFIX))
}
