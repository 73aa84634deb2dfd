//! Configuration types for arr-unpacker

use crate::error::{Error, Result};
use crate::types::Application;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest duration any setting accepts (one year); timers and record ages stay far from overflow
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Connection and path settings for one media manager
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StarrConfig {
    /// Which application this is
    pub application: Application,

    /// Base URL of the application (e.g. "http://localhost:8989")
    pub url: String,

    /// API key sent as `X-Api-Key`
    #[serde(default)]
    pub api_key: String,

    /// Directory the torrent client saves this application's downloads to
    pub path: PathBuf,

    /// Request timeout for queue fetches (default: 10s)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl StarrConfig {
    /// Config for `application` at `url`, saving downloads under `path`
    pub fn new(application: Application, url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            application,
            url: url.into(),
            api_key: String::new(),
            path: path.into(),
            timeout: default_timeout(),
        }
    }
}

/// Main configuration for the unpacker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Media managers to poll (at most one per application)
    #[serde(default)]
    pub applications: Vec<StarrConfig>,

    /// Grace period after import before extracted files are deleted (default: 5 minutes).
    /// Records are reaped from history after twice this delay.
    #[serde(default = "default_delete_delay", with = "duration_serde")]
    pub delete_delay: Duration,

    /// Interval between lifecycle passes (default: 1 minute)
    #[serde(default = "default_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Interval between queue polls (default: 2 minutes)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// How long shutdown waits for in-flight extractions and deletions (default: 0, no wait)
    #[serde(default, with = "duration_serde")]
    pub shutdown_drain: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            applications: Vec::new(),
            delete_delay: default_delete_delay(),
            interval: default_interval(),
            poll_interval: default_poll_interval(),
            shutdown_drain: Duration::ZERO,
        }
    }
}

impl Config {
    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make the loops misbehave
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::config("interval", "must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll_interval", "must be greater than zero"));
        }
        for (key, value) in [
            ("interval", self.interval),
            ("poll_interval", self.poll_interval),
            ("delete_delay", self.delete_delay),
            ("shutdown_drain", self.shutdown_drain),
        ] {
            check_max(key, value)?;
        }

        let mut seen = HashSet::new();
        for app in &self.applications {
            if !seen.insert(app.application) {
                return Err(Error::config(
                    "applications",
                    format!("{} is configured more than once", app.application),
                ));
            }
            check_max("applications.timeout", app.timeout)?;
            if let Err(e) = url::Url::parse(&app.url) {
                return Err(Error::config(
                    "applications.url",
                    format!("invalid {} url {:?}: {}", app.application, app.url, e),
                ));
            }
        }

        Ok(())
    }

    /// Configured applications, in config order
    pub fn application_list(&self) -> Vec<Application> {
        self.applications.iter().map(|a| a.application).collect()
    }

    /// Settings for one application
    pub fn application(&self, application: Application) -> Option<&StarrConfig> {
        self.applications
            .iter()
            .find(|a| a.application == application)
    }
}

fn check_max(key: &str, value: Duration) -> Result<()> {
    if value > MAX_DURATION {
        return Err(Error::config(
            key,
            format!(
                "{}s exceeds the maximum of {}s",
                value.as_secs(),
                MAX_DURATION.as_secs()
            ),
        ));
    }
    Ok(())
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_delete_delay() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2 * 60)
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
