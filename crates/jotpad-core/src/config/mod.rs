//! Application configuration.
//!
//! `AppConfig` is read from a JSON file and then overridden by environment
//! variables. Only safe-to-ship values live in the file; the API key is
//! expected to come from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const ENV_DATA_DIR: &str = "JOTPAD_DATA_DIR";
pub const ENV_API_URL: &str = "JOTPAD_API_URL";
pub const ENV_API_KEY: &str = "JOTPAD_API_KEY";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Directory holding the offline demo slots
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Base URL of the hosted notes API; online mode is disabled without it
    #[serde(default)]
    pub notes_api_url: Option<String>,
    #[serde(default)]
    pub notes_api_key: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    200
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            notes_api_url: None,
            notes_api_key: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Storage(format!(
                "Failed to read config at {}: {error}",
                path.display()
            ))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::InvalidInput(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    /// Apply `JOTPAD_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = normalize_text_option(lookup(ENV_DATA_DIR)) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.notes_api_url = Some(url);
        }
        if let Some(key) = normalize_text_option(lookup(ENV_API_KEY)) {
            self.notes_api_key = Some(key);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.notes_api_url {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(
                    "notes_api_url must include http:// or https://".to_string(),
                ));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidInput(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidInput(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Online mode needs a notes API to talk to.
    pub const fn remote_enabled(&self) -> bool {
        self.notes_api_url.is_some()
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    fn normalize(&mut self) {
        self.notes_api_url = normalize_text_option(self.notes_api_url.take());
        self.notes_api_key = normalize_text_option(self.notes_api_key.take());
    }
}
