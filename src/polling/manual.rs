//! Externally triggered polling.

use super::{PollingStrategy, Subscription, Tick};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct ManualInner {
    ticks: Vec<(u64, Tick)>,
    next_id: u64,
}

/// Polling strategy without a timer.
///
/// Ticks run only when [`fire`](Self::fire) is awaited, one after another in
/// registration order. Clones share registrations, so keep a clone to fire
/// after handing one to the builder.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::prelude::*;
/// use polling_config::sources::MemorySource;
///
/// # async fn example() -> Result<()> {
/// let strategy = ManualPollingStrategy::new();
/// let source = MemorySource::new("app");
/// source.set("a", "A");
///
/// let config = PollingDynamicConfig::builder()
///     .with_source(source.clone())
///     .with_strategy(strategy.clone())
///     .build()
///     .await?;
///
/// strategy.fire().await;
/// assert_eq!(config.get_string("a")?, "A");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ManualPollingStrategy {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualPollingStrategy {
    /// Create a strategy with no registered ticks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered tick to completion, in registration order.
    ///
    /// A registration stopped while an earlier tick of the same `fire` runs
    /// is skipped.
    pub async fn fire(&self) {
        let ids: Vec<u64> = self.inner.lock().ticks.iter().map(|(id, _)| *id).collect();

        for id in ids {
            // Started under the lock so a concurrent stop either wins or waits
            let pending = {
                let inner = self.inner.lock();
                match inner.ticks.iter().find(|(tick_id, _)| *tick_id == id) {
                    Some((_, tick)) => tick(),
                    None => continue,
                }
            };
            pending.await;
        }
    }

    /// Get the number of registered ticks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().ticks.len()
    }
}

impl PollingStrategy for ManualPollingStrategy {
    fn subscribe(&self, tick: Tick) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.ticks.push((id, tick));
            id
        };

        let registry = Arc::clone(&self.inner);
        Subscription::new(move || {
            registry.lock().ticks.retain(|(tick_id, _)| *tick_id != id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use parking_lot::Mutex as SyncMutex;

    fn recording_tick(log: &Arc<SyncMutex<Vec<&'static str>>>, name: &'static str) -> Tick {
        let log = Arc::clone(log);
        Arc::new(move || {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(name);
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_fire_runs_ticks_in_order() {
        let log = Arc::new(SyncMutex::new(Vec::new()));
        let strategy = ManualPollingStrategy::new();
        let _first = strategy.subscribe(recording_tick(&log, "first"));
        let _second = strategy.subscribe(recording_tick(&log, "second"));

        strategy.fire().await;
        strategy.fire().await;

        assert_eq!(*log.lock(), vec!["first", "second", "first", "second"]);
    }

    #[tokio::test]
    async fn test_fire_without_subscribers() {
        let strategy = ManualPollingStrategy::new();
        strategy.fire().await;
        assert_eq!(strategy.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_unregisters() {
        let log = Arc::new(SyncMutex::new(Vec::new()));
        let strategy = ManualPollingStrategy::new();
        let first = strategy.subscribe(recording_tick(&log, "first"));
        let _second = strategy.subscribe(recording_tick(&log, "second"));
        assert_eq!(strategy.subscriber_count(), 2);

        first.stop();
        assert_eq!(strategy.subscriber_count(), 1);

        strategy.fire().await;
        assert_eq!(*log.lock(), vec!["second"]);
    }

    #[tokio::test]
    async fn test_tick_stopped_during_fire_is_skipped() {
        let log = Arc::new(SyncMutex::new(Vec::new()));
        let strategy = ManualPollingStrategy::new();
        let second_slot: Arc<SyncMutex<Option<Subscription>>> = Arc::new(SyncMutex::new(None));

        let slot = Arc::clone(&second_slot);
        let first_log = Arc::clone(&log);
        let _first = strategy.subscribe(Arc::new(move || {
            let slot = Arc::clone(&slot);
            let log = Arc::clone(&first_log);
            async move {
                log.lock().push("first");
                if let Some(second) = slot.lock().take() {
                    second.stop();
                }
            }
            .boxed()
        }));
        *second_slot.lock() = Some(strategy.subscribe(recording_tick(&log, "second")));

        strategy.fire().await;
        assert_eq!(*log.lock(), vec!["first"]);
        assert_eq!(strategy.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_registrations() {
        let log = Arc::new(SyncMutex::new(Vec::new()));
        let strategy = ManualPollingStrategy::new();
        let trigger = strategy.clone();
        let _subscription = strategy.subscribe(recording_tick(&log, "tick"));

        trigger.fire().await;
        assert_eq!(*log.lock(), vec!["tick"]);
    }
}
