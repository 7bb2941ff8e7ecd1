//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/gathercal/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [store]
//! path = "/var/lib/gathercal/store.json"
//!
//! [scheduler]
//! interval_hours = 24
//!
//! [calendar]
//! days_ahead = 90
//! week_links = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gathercal_server::{
    CalendarConfig, FailurePolicy, MaterializerConfig, SchedulerConfig, ServerConfig,
};

use crate::error::{ClientError, ClientResult};

/// Configuration for the gathercal client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Event store settings.
    pub store: StoreSettings,

    /// Expansion settings.
    pub materializer: MaterializerSettings,

    /// Daemon schedule.
    pub scheduler: SchedulerSettings,

    /// Calendar view settings.
    pub calendar: CalendarSettings,
}

/// Where events and templates are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the JSON store; defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerSettings {
    /// Abort a run at the first failing template.
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Hours between expansion runs.
    pub interval_hours: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { interval_hours: 24 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Days after today shown by the upcoming view.
    pub days_ahead: u64,

    /// Seconds a computed calendar is reused before it is rebuilt.
    pub cache_ttl_secs: u64,

    /// Attach week page links to each day.
    pub week_links: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        let defaults = CalendarConfig::default();
        Self {
            days_ahead: defaults.days_ahead,
            cache_ttl_secs: defaults.cache_ttl.as_secs(),
            week_links: defaults.week_links,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("{}: {}", path.display(), e)))
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gathercal")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gathercal")
    }

    /// The JSON store file, configured or defaulted.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("store.json"))
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ClientResult<()> {
        if self.scheduler.interval_hours == 0 {
            return Err(ClientError::config(
                "scheduler.interval_hours must be at least 1",
            ));
        }
        if let Some(ref path) = self.store.path
            && path.is_dir()
        {
            return Err(ClientError::config(format!(
                "store.path {} is a directory",
                path.display()
            )));
        }
        Ok(())
    }

    /// Builds the server-side configuration.
    pub fn to_server_config(&self) -> ServerConfig {
        let policy = if self.materializer.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::ContinueOnError
        };
        ServerConfig::default()
            .with_materializer(MaterializerConfig::default().with_failure_policy(policy))
            .with_scheduler(SchedulerConfig::every_hours(self.scheduler.interval_hours))
            .with_calendar(
                CalendarConfig::default()
                    .with_days_ahead(self.calendar.days_ahead)
                    .with_cache_ttl(Duration::from_secs(self.calendar.cache_ttl_secs))
                    .with_week_links(self.calendar.week_links),
            )
    }
}
