//! Agent configuration
//!
//! Configuration is assembled once at startup from an optional TOML file and
//! command-line overrides, validated, and then shared read-only for the life
//! of the process.

use crate::error::{Error, Result};
use crate::naming::MatchRule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default number of archives kept per profile
pub const DEFAULT_RETENTION_LIMIT: usize = 10;

/// Default capacity of the notification channel
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Width of the time bucket that repeated changes collapse into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One archive per profile per hour
    #[default]
    Hour,
    /// One archive per profile per day
    Day,
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            other => Err(Error::Configuration(format!(
                "unknown interval '{}' (expected hour or day)",
                other
            ))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Hour => f.write_str("hour"),
            Granularity::Day => f.write_str("day"),
        }
    }
}

/// Validated, immutable agent configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Directory holding one subdirectory per profile
    pub root: PathBuf,
    /// Time bucket width
    pub granularity: Granularity,
    /// Archives allowed per profile before eviction
    pub retention_limit: usize,
    /// How root-level files are attributed to a profile
    pub match_rule: MatchRule,
    /// Coalescing window for bursts of changes (0 = disabled)
    pub debounce_ms: u64,
    /// Capacity of the notification channel and of each profile lane
    pub event_buffer: usize,
}

impl VaultConfig {
    /// Configuration for `root` with every other knob at its default
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            granularity: Granularity::default(),
            retention_limit: DEFAULT_RETENTION_LIMIT,
            match_rule: MatchRule::default(),
            debounce_ms: 0,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.retention_limit = limit;
        self
    }

    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.match_rule = rule;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::Configuration(format!(
                "\"{}\" directory does not exist",
                self.root.display()
            )));
        }

        if self.retention_limit == 0 {
            return Err(Error::Configuration(
                "retention limit must be at least 1".to_string(),
            ));
        }

        if self.event_buffer == 0 {
            return Err(Error::Configuration(
                "event buffer must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Raw `[watch]` settings, every field optional
///
/// File values and command-line values are both expressed as
/// `WatchSettings`; [`WatchSettings::merge`] layers them and
/// [`WatchSettings::resolve`] fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    pub root: Option<PathBuf>,
    pub interval: Option<Granularity>,
    pub limit: Option<usize>,
    pub match_rule: Option<MatchRule>,
    pub debounce_ms: Option<u64>,
    pub event_buffer: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    watch: WatchSettings,
}

impl WatchSettings {
    /// Load the `[watch]` table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
    }

    /// Parse the `[watch]` table from TOML text
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file.watch)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: WatchSettings) -> WatchSettings {
        WatchSettings {
            root: overrides.root.or(self.root),
            interval: overrides.interval.or(self.interval),
            limit: overrides.limit.or(self.limit),
            match_rule: overrides.match_rule.or(self.match_rule),
            debounce_ms: overrides.debounce_ms.or(self.debounce_ms),
            event_buffer: overrides.event_buffer.or(self.event_buffer),
        }
    }

    /// Fill defaults and validate
    ///
    /// `default_root` is used when neither the file nor the command line
    /// named a root.
    pub fn resolve(self, default_root: impl Into<PathBuf>) -> Result<VaultConfig> {
        let mut config = VaultConfig::new(self.root.unwrap_or_else(|| default_root.into()));
        if let Some(interval) = self.interval {
            config.granularity = interval;
        }
        if let Some(limit) = self.limit {
            config.retention_limit = limit;
        }
        if let Some(rule) = self.match_rule {
            config.match_rule = rule;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if let Some(event_buffer) = self.event_buffer {
            config.event_buffer = event_buffer;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Example configuration file
pub fn example_config() -> &'static str {
    r#"# savevault configuration
#
# Every key is optional; command-line flags override file values.

[watch]
# Directory containing one subdirectory per save profile
root = "/home/me/.config/EldenRing"

# Bucket width: "hour" or "day"
interval = "hour"

# Archives kept per profile
limit = 10

# "legacy": a file belongs to a profile when its path contains the profile path
# "delimited": only "<profile>_*.zip" files belong to a profile
match_rule = "legacy"

# Coalesce bursts of changes within this window (0 disables)
debounce_ms = 0

# Notification channel capacity
event_buffer = 256
"#
}
