//! Builder for constructing PollingDynamicConfig instances.

use crate::core::{PollOutcome, PollingDynamicConfig, PollingSettings, SourceReader};
use crate::error::{ConfigError, Result};
use crate::notify::ConfigObserver;
use crate::polling::{PollingStrategy, ScheduledPollingStrategy};
use crate::sources::{FileSource, PropertySource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "http")]
use crate::sources::HttpSource;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Interval used when no strategy is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Builder for constructing a `PollingDynamicConfig` instance.
///
/// Sources are polled in the order they are added; later sources override
/// earlier ones. Without [`with_strategy`](Self::with_strategy) the config
/// polls every [`DEFAULT_POLL_INTERVAL`].
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let config = PollingDynamicConfig::builder()
///     .with_file("/etc/app/defaults.properties")
///     .with_url("https://config.example.com/app.properties")
///     .with_strategy(ScheduledPollingStrategy::fixed(Duration::from_secs(60)))
///     .with_initial_poll(true)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct PollingConfigBuilder {
    sources: Vec<Arc<dyn PropertySource>>,
    strategy: Option<Box<dyn PollingStrategy>>,
    observers: Vec<Arc<dyn ConfigObserver>>,
    initial_poll: bool,
    /// First error raised while adding sources, reported by `build`
    pending_error: Option<ConfigError>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl PollingConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            strategy: None,
            observers: Vec::new(),
            initial_poll: false,
            pending_error: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Add a property source.
    pub fn with_source<S: PropertySource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add a remote `.properties` endpoint with default HTTP settings.
    ///
    /// Use [`HttpSource::builder`] with [`with_source`](Self::with_source)
    /// for authentication or a custom timeout.
    #[cfg(feature = "http")]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.with_http(HttpSource::builder().with_url(url))
    }

    #[cfg(feature = "http")]
    fn with_http(mut self, builder: crate::sources::HttpSourceBuilder) -> Self {
        match builder.build() {
            Ok(source) => self.sources.push(Arc::new(source)),
            Err(e) => self.defer(e),
        }
        self
    }

    /// Add a local `.properties` file.
    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_source(FileSource::new(path))
    }

    /// Set the polling strategy.
    pub fn with_strategy<S: PollingStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Register an observer before polling starts.
    pub fn with_observer(mut self, observer: Arc<dyn ConfigObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run one poll during [`build`](Self::build) and fail the build if it fails.
    ///
    /// Without this the config starts uninitialized and is filled by the
    /// strategy's first tick.
    pub fn with_initial_poll(mut self, enabled: bool) -> Self {
        self.initial_poll = enabled;
        self
    }

    /// Record poll metrics with the given meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(PollMetrics::new(meter));
        self
    }

    /// Apply declarative settings.
    ///
    /// Files are added before URLs, each in listed order. The strategy is
    /// replaced by a scheduled one using the configured interval.
    pub fn with_settings(mut self, settings: &PollingSettings) -> Self {
        if let Err(e) = settings.validate() {
            self.defer(e);
            return self;
        }

        for file in &settings.files {
            self = self.with_file(file.clone());
        }

        #[cfg(feature = "http")]
        for url in &settings.urls {
            self = self.with_http(
                HttpSource::builder()
                    .with_url(url.clone())
                    .with_timeout(settings.request_timeout()),
            );
        }

        #[cfg(not(feature = "http"))]
        if !settings.urls.is_empty() {
            self.defer(ConfigError::InvalidSource(
                "remote URLs require the `http` feature".to_string(),
            ));
        }

        self.initial_poll = settings.initial_poll;
        self.with_strategy(settings.strategy())
    }

    fn defer(&mut self, error: ConfigError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error);
        }
    }

    /// Build the polling config and start polling.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A source could not be constructed
    /// - No sources were added
    /// - The initial poll was requested and failed ([`ConfigError::InitialPoll`])
    pub async fn build(self) -> Result<PollingDynamicConfig> {
        if let Some(error) = self.pending_error {
            return Err(error);
        }

        let reader = SourceReader::new(self.sources)?;
        let config = PollingDynamicConfig::unscheduled(reader);

        #[cfg(feature = "metrics")]
        let config = match self.metrics {
            Some(metrics) => config.with_metrics(metrics),
            None => config,
        };

        for observer in self.observers {
            config.add_observer(observer);
        }

        if self.initial_poll {
            if let PollOutcome::Failed(error) = config.poll().await {
                return Err(ConfigError::InitialPoll(Box::new(error)));
            }
        }

        match self.strategy {
            Some(strategy) => config.start(strategy.as_ref()),
            None => config.start(&ScheduledPollingStrategy::fixed(DEFAULT_POLL_INTERVAL)),
        }

        Ok(config)
    }
}

impl Default for PollingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
