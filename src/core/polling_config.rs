//! The polling configuration handle providing lock-free reads.

use crate::core::{PollingConfigBuilder, PropertyReader, Snapshot, SnapshotStore, SourceReader};
use crate::error::ConfigError;
use crate::notify::{ConfigObserver, ObserverRegistry};
use crate::polling::{PollingStrategy, Subscription, Tick};
use crate::sources::RawProperties;
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Whether a polling config has published anything yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No poll has succeeded; every key reads as absent.
    Uninitialized,
    /// At least one poll has succeeded.
    Ready,
}

/// Result of one poll cycle.
#[derive(Debug)]
pub enum PollOutcome {
    /// A new snapshot was published.
    Updated {
        /// Version of the published snapshot
        version: u64,
        /// Keys added, removed or changed, sorted
        changed_keys: Vec<String>,
    },
    /// The fetch failed; the previous snapshot stays published.
    Failed(ConfigError),
}

impl PollOutcome {
    /// Whether the cycle published a snapshot.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Dynamic configuration kept up to date by polling its sources.
///
/// Every tick of the polling strategy fetches all sources. A successful
/// fetch is merged into a new [`Snapshot`], published atomically and then
/// announced to observers. A failed fetch leaves the published snapshot
/// untouched and is only reported through `on_error`.
///
/// Reads go straight to the published snapshot via `arc-swap` and never wait
/// for a poll in progress. Poll cycles of one instance are serialized:
/// a tick arriving while another cycle runs waits for it and then runs a
/// full cycle of its own.
///
/// Cloning is cheap and clones share everything. Polling stops once the last
/// clone is dropped or [`shutdown`](Self::shutdown) is called.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let config = PollingDynamicConfig::builder()
///     .with_url("https://config.example.com/app.properties")
///     .with_strategy(ScheduledPollingStrategy::fixed(Duration::from_secs(30)))
///     .build()
///     .await?;
///
/// let port = config.get_i64_or("server.port", 8080)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PollingDynamicConfig {
    inner: Arc<Inner>,
}

struct Inner {
    store: SnapshotStore,
    reader: SourceReader,
    observers: ObserverRegistry,
    /// Serializes poll cycles; readers never take it
    cycle: tokio::sync::Mutex<()>,
    subscription: Mutex<Option<Subscription>>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl PollingDynamicConfig {
    /// Create a new builder.
    pub fn builder() -> PollingConfigBuilder {
        PollingConfigBuilder::new()
    }

    /// Create a polling config and register its tick with `strategy`.
    ///
    /// Nothing is fetched until the strategy ticks.
    pub fn new(reader: SourceReader, strategy: &dyn PollingStrategy) -> Self {
        let config = Self::unscheduled(reader);
        config.start(strategy);
        config
    }

    /// Create a polling config that is not yet attached to a strategy.
    pub(crate) fn unscheduled(reader: SourceReader) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: SnapshotStore::new(),
                reader,
                observers: ObserverRegistry::new(),
                cycle: tokio::sync::Mutex::new(()),
                subscription: Mutex::new(None),
                #[cfg(feature = "metrics")]
                metrics: None,
            }),
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: PollMetrics) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.metrics = Some(metrics);
        }
        self
    }

    /// Register this config's tick with a strategy, replacing any previous one.
    pub(crate) fn start(&self, strategy: &dyn PollingStrategy) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let tick: Tick = Arc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.poll().await;
                }
            }
            .boxed()
        });

        let subscription = strategy.subscribe(tick);
        let previous = self.inner.subscription.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.stop();
        }
        info!(sources = ?self.inner.reader.source_names(), "Polling started");
    }

    /// Run one poll cycle now.
    ///
    /// This is the same cycle a strategy tick runs. Fetch failures are
    /// reported to observers and returned as [`PollOutcome::Failed`]; they
    /// never disturb the published snapshot.
    pub async fn poll(&self) -> PollOutcome {
        self.inner.poll().await
    }

    /// Get the currently published snapshot.
    ///
    /// This is a lock-free operation; hold on to the returned `Arc` to read
    /// several keys from one consistent view.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.current()
    }

    /// Get the snapshot that was published before the current one.
    pub fn previous_snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.previous()
    }

    /// Whether a poll has succeeded yet.
    pub fn state(&self) -> PollState {
        if self.snapshot().is_initialized() {
            PollState::Ready
        } else {
            PollState::Uninitialized
        }
    }

    /// Register an observer, returning `false` if it was already registered.
    pub fn add_observer(&self, observer: Arc<dyn ConfigObserver>) -> bool {
        let added = self.inner.observers.add(observer);
        self.inner.record_observer_count();
        added
    }

    /// Unregister an observer, returning whether it was registered.
    pub fn remove_observer(&self, observer: &Arc<dyn ConfigObserver>) -> bool {
        let removed = self.inner.observers.remove(observer);
        self.inner.record_observer_count();
        removed
    }

    /// Get the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Names of the polled sources in precedence order (lowest first).
    pub fn source_names(&self) -> Vec<String> {
        self.inner.reader.source_names()
    }

    /// Whether the config is still attached to its polling strategy.
    pub fn is_polling(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    /// Stop polling.
    ///
    /// No tick starts after this returns; a cycle already running completes.
    /// The last published snapshot remains readable.
    pub fn shutdown(&self) {
        let subscription = self.inner.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.stop();
            info!("Polling stopped");
        }
    }
}

impl PropertyReader for PollingDynamicConfig {
    fn get_value(&self, key: &str) -> Option<config::Value> {
        self.snapshot().raw(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.snapshot().keys()
    }

    fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Inner {
    async fn poll(&self) -> PollOutcome {
        let _cycle = self.cycle.lock().await;

        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_poll());

        debug!(sources = self.reader.len(), "Polling configuration sources");
        let outcome = match self.reader.fetch().await {
            Ok(properties) => self.publish(properties),
            Err(error) => self.report(error),
        };

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            if outcome.is_updated() {
                metrics.record_poll_success(timer);
            } else {
                metrics.record_poll_failure(timer);
            }
            metrics.update_snapshot_age();
        }

        outcome
    }

    fn publish(&self, properties: RawProperties) -> PollOutcome {
        let previous = self.store.current();
        let next = Arc::new(Snapshot::new(properties, previous.version() + 1));
        let changed_keys = previous.changed_keys(&next);

        self.store.replace(Arc::clone(&next));

        if previous.is_initialized() {
            debug!(
                version = next.version(),
                changed = changed_keys.len(),
                "Configuration updated"
            );
        } else {
            info!(
                version = next.version(),
                keys = next.len(),
                "Configuration initialized"
            );
        }

        let failures = self.observers.notify_update(&next, &changed_keys);
        self.record_observer_failures(failures);

        PollOutcome::Updated {
            version: next.version(),
            changed_keys,
        }
    }

    fn report(&self, error: ConfigError) -> PollOutcome {
        let current = self.store.current();
        warn!(
            error = %error,
            version = current.version(),
            "Configuration poll failed; keeping last good snapshot"
        );

        let failures = self.observers.notify_error(&error, &current);
        self.record_observer_failures(failures);

        PollOutcome::Failed(error)
    }

    fn record_observer_failures(&self, _failures: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_observer_failures(_failures);
        }
    }

    fn record_observer_count(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.update_observer_count(self.observers.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ObserverFn;
    use crate::polling::ManualPollingStrategy;
    use crate::sources::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts each kind of notification.
    #[derive(Default)]
    struct Counting {
        updates: AtomicUsize,
        key_updates: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConfigObserver for Counting {
        fn on_update(&self, _snapshot: &Snapshot) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn on_key_update(&self, _key: &str, _snapshot: &Snapshot) {
            self.key_updates.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &ConfigError, _snapshot: &Snapshot) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config_over(source: &MemorySource, strategy: &ManualPollingStrategy) -> PollingDynamicConfig {
        PollingDynamicConfig::new(SourceReader::single(source.clone()), strategy)
    }

    #[tokio::test]
    async fn test_uninitialized_reads() {
        let source = MemorySource::new("prop1");
        source.set("a", "A");
        let config = config_over(&source, &ManualPollingStrategy::new());

        assert_eq!(config.state(), PollState::Uninitialized);
        assert!(PropertyReader::is_empty(&config));
        assert!(matches!(config.get_string("a"), Err(ConfigError::NotFound(_))));
        assert_eq!(config.get_string_or("a", "default").unwrap(), "default");
    }

    #[tokio::test]
    async fn test_tick_polls() {
        let source = MemorySource::new("prop1");
        let strategy = ManualPollingStrategy::new();
        let config = config_over(&source, &strategy);

        source.set("a", "a_value");
        strategy.fire().await;
        assert_eq!(config.state(), PollState::Ready);
        assert_eq!(config.get_string("a").unwrap(), "a_value");

        source.set("a", "b_value");
        assert_eq!(config.get_string("a").unwrap(), "a_value");
        strategy.fire().await;
        assert_eq!(config.get_string("a").unwrap(), "b_value");
    }

    #[tokio::test]
    async fn test_failure_keeps_snapshot() {
        let source = MemorySource::new("prop1");
        let config = config_over(&source, &ManualPollingStrategy::new());
        let observer = Arc::new(Counting::default());
        config.add_observer(observer.clone());

        source.set("a", "A");
        assert!(config.poll().await.is_updated());
        let before = config.snapshot();

        source.set("a", "ANew");
        source.fail_with_status(Some(500));
        let outcome = config.poll().await;
        assert!(matches!(outcome, PollOutcome::Failed(ConfigError::Status { status: 500, .. })));

        assert!(Arc::ptr_eq(&before, &config.snapshot()));
        assert_eq!(config.get_string("a").unwrap(), "A");
        assert_eq!(observer.updates.load(Ordering::SeqCst), 1);
        assert_eq!(observer.errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_changed_keys_reported() {
        let source = MemorySource::new("prop1");
        let config = config_over(&source, &ManualPollingStrategy::new());
        let changed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let changed_clone = Arc::clone(&changed);
        config.add_observer(Arc::new(ObserverFn::new().with_key_update(move |key, _| {
            changed_clone.lock().push(key.to_string());
        })));

        source.set("a", "A");
        source.set("b", "B");
        config.poll().await;
        assert_eq!(*changed.lock(), vec!["a", "b"]);

        changed.lock().clear();
        source.set("b", "BNew");
        source.remove("a");
        source.set("c", "C");
        match config.poll().await {
            PollOutcome::Updated { version, changed_keys } => {
                assert_eq!(version, 2);
                assert_eq!(changed_keys, vec!["a", "b", "c"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(*changed.lock(), vec!["a", "b", "c"]);
        assert_eq!(config.previous_snapshot().version(), 1);
    }

    #[tokio::test]
    async fn test_identical_poll_fires_update_without_key_updates() {
        let source = MemorySource::new("prop1");
        let config = config_over(&source, &ManualPollingStrategy::new());
        let observer = Arc::new(Counting::default());
        config.add_observer(observer.clone());

        source.set("a", "A");
        config.poll().await;
        config.poll().await;

        assert_eq!(observer.updates.load(Ordering::SeqCst), 2);
        assert_eq!(observer.key_updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_detaches_strategy() {
        let source = MemorySource::new("prop1");
        let strategy = ManualPollingStrategy::new();
        let config = config_over(&source, &strategy);
        assert!(config.is_polling());
        assert_eq!(strategy.subscriber_count(), 1);

        config.shutdown();
        assert!(!config.is_polling());
        assert_eq!(strategy.subscriber_count(), 0);

        source.set("a", "A");
        strategy.fire().await;
        assert_eq!(config.state(), PollState::Uninitialized);
    }

    #[tokio::test]
    async fn test_shutdown_from_another_observer_during_fire() {
        let source = MemorySource::new("prop1");
        source.set("a", "A");
        let strategy = ManualPollingStrategy::new();
        let first = config_over(&source, &strategy);
        let second = config_over(&source, &strategy);

        let to_stop = second.clone();
        first.add_observer(Arc::new(ObserverFn::new().with_update(move |_| {
            to_stop.shutdown();
        })));

        strategy.fire().await;

        assert_eq!(first.state(), PollState::Ready);
        assert!(!second.is_polling());
        assert_eq!(second.state(), PollState::Uninitialized);
        assert_eq!(strategy.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_detaches_strategy() {
        let strategy = ManualPollingStrategy::new();
        let config = config_over(&MemorySource::new("prop1"), &strategy);
        let clone = config.clone();

        drop(config);
        assert_eq!(strategy.subscriber_count(), 1);
        drop(clone);
        assert_eq!(strategy.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_observer() {
        let config = config_over(&MemorySource::new("prop1"), &ManualPollingStrategy::new());
        let observer: Arc<dyn ConfigObserver> = Arc::new(Counting::default());

        assert!(config.add_observer(Arc::clone(&observer)));
        assert!(!config.add_observer(Arc::clone(&observer)));
        assert_eq!(config.observer_count(), 1);
        assert!(config.remove_observer(&observer));
        assert_eq!(config.observer_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_polls_are_serialized() {
        let source = MemorySource::new("prop1");
        source.set("a", "A");
        let config = config_over(&source, &ManualPollingStrategy::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let config = config.clone();
                tokio::spawn(async move { config.poll().await })
            })
            .collect();

        let mut versions = Vec::new();
        for handle in handles {
            if let PollOutcome::Updated { version, .. } = handle.await.unwrap() {
                versions.push(version);
            }
        }
        versions.sort();

        assert_eq!(versions, (1..=16).collect::<Vec<u64>>());
        assert_eq!(config.snapshot().version(), 16);
    }
}

#[cfg(all(test, feature = "metrics"))]
mod metrics_tests {
    use super::*;
    use crate::notify::ObserverFn;
    use crate::polling::ManualPollingStrategy;
    use crate::sources::MemorySource;
    use opentelemetry::metrics::MeterProvider;
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
    use std::collections::BTreeSet;

    fn exported_names(provider: &SdkMeterProvider, exporter: &InMemoryMetricExporter) -> BTreeSet<String> {
        provider.force_flush().unwrap();
        exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(|resource| resource.scope_metrics())
            .flat_map(|scope| scope.metrics())
            .map(|metric| metric.name().to_string())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_poll_cycle_records_metrics() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();

        let source = MemorySource::new("prop1");
        source.fail_with_status(Some(500));
        let config = PollingDynamicConfig::builder()
            .with_source(source.clone())
            .with_strategy(ManualPollingStrategy::new())
            .with_metrics(provider.meter("test"))
            .build()
            .await
            .unwrap();

        assert!(!config.poll().await.is_updated());
        let names = exported_names(&provider, &exporter);
        assert!(names.contains("polling_config.poll.attempts"));
        assert!(names.contains("polling_config.poll.failures"));
        assert!(!names.contains("polling_config.poll.success"));
        assert!(!names.contains("polling_config.snapshot.age"));

        config.add_observer(Arc::new(ObserverFn::new().with_update(|_| panic!("observer exploded"))));
        source.fail_with_status(None);
        source.set("a", "A");
        assert!(config.poll().await.is_updated());

        let names = exported_names(&provider, &exporter);
        assert!(names.contains("polling_config.poll.success"));
        assert!(names.contains("polling_config.snapshot.age"));
        assert!(names.contains("polling_config.observers.registered"));
        assert!(names.contains("polling_config.observers.failures"));
    }
}
