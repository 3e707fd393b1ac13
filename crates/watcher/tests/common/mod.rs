//! Shared fixtures for dispatcher integration tests

use chrono::{NaiveDate, NaiveDateTime};
use savevault_core::{Granularity, ManualClock, MatchRule, VaultConfig};
use savevault_watcher::{Dispatcher, ProfilePipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A watched root with a manual clock and a running dispatcher
pub struct TestVault {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub dispatcher: Dispatcher,
}

impl TestVault {
    pub fn new(limit: usize, granularity: Granularity, rule: MatchRule, profiles: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        for name in profiles {
            write_save(&dir.path().join(name), b"initial");
        }

        let config = VaultConfig::new(dir.path())
            .with_retention_limit(limit)
            .with_granularity(granularity)
            .with_match_rule(rule);
        config.validate().unwrap();

        let clock = Arc::new(ManualClock::new(at(1, 0, 0)));
        let pipeline = ProfilePipeline::new(Arc::new(config), clock.clone());
        let dispatcher = Dispatcher::new(Arc::new(pipeline)).unwrap();

        Self {
            dir,
            clock,
            dispatcher,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn profile(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Sorted names of every `.zip` in the root
    pub fn archives(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(self.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".zip"))
            .collect();
        names.sort();
        names
    }
}

/// 2024-03-`day` `hour`:`minute`
pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn write_save(profile: &Path, contents: &[u8]) {
    fs::create_dir_all(profile).unwrap();
    fs::write(profile.join("ER0000.sl2"), contents).unwrap();
}

pub fn read_save(archive: &Path) -> Vec<u8> {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name("ER0000.sl2").unwrap();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    buf
}
