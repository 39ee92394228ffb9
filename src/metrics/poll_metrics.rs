//! Poll metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for poll cycles.
///
/// Tracks poll attempts, success/failure rates, latencies, snapshot age and
/// observer health using OpenTelemetry metrics.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::metrics::PollMetrics;
/// use opentelemetry::global;
///
/// let metrics = PollMetrics::new(global::meter("polling-config"));
///
/// let timer = metrics.start_poll();
/// // ... fetch sources ...
/// metrics.record_poll_success(timer);
/// ```
#[derive(Clone)]
pub struct PollMetrics {
    poll_attempts: Counter<u64>,
    poll_success: Counter<u64>,
    poll_failures: Counter<u64>,
    poll_duration: Histogram<f64>,
    snapshot_age_seconds: Gauge<i64>,
    observers: Gauge<i64>,
    observer_failures: Counter<u64>,
    /// Time of the last published snapshot, `None` until the first one
    last_update: Arc<parking_lot::Mutex<Option<Instant>>>,
}

impl PollMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let poll_attempts = meter
            .u64_counter("polling_config.poll.attempts")
            .with_description("Total number of poll cycles started")
            .build();

        let poll_success = meter
            .u64_counter("polling_config.poll.success")
            .with_description("Number of poll cycles that published a snapshot")
            .build();

        let poll_failures = meter
            .u64_counter("polling_config.poll.failures")
            .with_description("Number of poll cycles that failed to fetch")
            .build();

        let poll_duration = meter
            .f64_histogram("polling_config.poll.duration")
            .with_description("Duration of poll cycles in seconds")
            .with_unit("s")
            .build();

        let snapshot_age_seconds = meter
            .i64_gauge("polling_config.snapshot.age")
            .with_description("Time since the last published snapshot in seconds")
            .with_unit("s")
            .build();

        let observers = meter
            .i64_gauge("polling_config.observers.registered")
            .with_description("Number of registered observers")
            .build();

        let observer_failures = meter
            .u64_counter("polling_config.observers.failures")
            .with_description("Number of observer callbacks that panicked")
            .build();

        Self {
            poll_attempts,
            poll_success,
            poll_failures,
            poll_duration,
            snapshot_age_seconds,
            observers,
            observer_failures,
            last_update: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Start a poll timer.
    ///
    /// Returns an `Instant` that should be passed to `record_poll_success` or
    /// `record_poll_failure` when the cycle completes.
    pub fn start_poll(&self) -> Instant {
        self.poll_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a poll that published a new snapshot.
    pub fn record_poll_success(&self, start: Instant) {
        self.poll_success.add(1, &[]);
        self.poll_duration.record(start.elapsed().as_secs_f64(), &[]);
        *self.last_update.lock() = Some(Instant::now());
    }

    /// Record a poll whose fetch failed.
    pub fn record_poll_failure(&self, start: Instant) {
        self.poll_failures.add(1, &[]);
        self.poll_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record observer callbacks that panicked during one dispatch.
    pub fn record_observer_failures(&self, count: usize) {
        if count > 0 {
            self.observer_failures.add(count as u64, &[]);
        }
    }

    /// Update the number of registered observers.
    pub fn update_observer_count(&self, count: usize) {
        self.observers.record(count as i64, &[]);
    }

    /// Update the snapshot age metric.
    ///
    /// Call periodically to track how stale the published snapshot is while
    /// sources are failing. Nothing is recorded before the first snapshot.
    pub fn update_snapshot_age(&self) {
        let last_update = *self.last_update.lock();
        if let Some(last_update) = last_update {
            self.snapshot_age_seconds
                .record(last_update.elapsed().as_secs() as i64, &[]);
        }
    }

    /// Time since the last published snapshot, `None` before the first one.
    pub fn snapshot_age(&self) -> Option<std::time::Duration> {
        self.last_update.lock().map(|at| at.elapsed())
    }
}
