//! Declarative polling settings loaded with the `config` crate.

use crate::error::{ConfigError, Result};
use crate::polling::ScheduledPollingStrategy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_INTERVAL_MS: u64 = 30_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Settings describing what to poll and how often.
///
/// Every field has a default, so a settings file only needs the entries it
/// changes. Apply them with
/// [`PollingConfigBuilder::with_settings`](crate::core::PollingConfigBuilder::with_settings).
///
/// ```toml
/// urls = ["https://config.example.com/app.properties"]
/// files = ["/etc/app/defaults.properties"]
/// interval_ms = 60000
/// initial_poll = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Remote `.properties` endpoints, in precedence order
    pub urls: Vec<String>,
    /// Local `.properties` files, in precedence order
    pub files: Vec<PathBuf>,
    /// Delay between polls in milliseconds
    pub interval_ms: u64,
    /// Delay before the first poll in milliseconds
    pub initial_delay_ms: u64,
    /// Timeout for each remote request in milliseconds
    pub request_timeout_ms: u64,
    /// Run one poll while building and fail the build if it fails
    pub initial_poll: bool,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            files: Vec::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
            initial_delay_ms: 0,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            initial_poll: false,
        }
    }
}

impl PollingSettings {
    /// Load settings from a YAML, TOML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if the file is missing, cannot be
    /// parsed or holds invalid values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an optional file, overridden by environment variables.
    ///
    /// Variables are named `{PREFIX}_{FIELD}`, e.g. `APP_INTERVAL_MS=5000`.
    /// `{PREFIX}_URLS` and `{PREFIX}_FILES` take comma-separated lists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if the merged settings cannot be
    /// parsed or hold invalid values.
    pub fn load(path: impl AsRef<Path>, env_prefix: &str) -> Result<Self> {
        let env = Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("urls")
            .with_list_parse_key("files")
            .try_parsing(true);

        let settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the values can drive a poller.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Settings(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Settings(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay between polls.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Delay before the first poll.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Timeout for each remote request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// A scheduled strategy using the configured interval and initial delay.
    pub fn strategy(&self) -> ScheduledPollingStrategy {
        ScheduledPollingStrategy::fixed(self.interval()).with_initial_delay(self.initial_delay())
    }
}
