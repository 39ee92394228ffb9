//! Polling strategies deciding when the configuration is fetched.
//!
//! A strategy only knows about [`Tick`] callbacks; the polling config
//! registers one tick at construction and the strategy decides when to run
//! it. Two strategies are provided:
//!
//! - [`ManualPollingStrategy`]: ticks run only when [`fire`](ManualPollingStrategy::fire)
//!   is called, for tests and externally scheduled polling
//! - [`ScheduledPollingStrategy`]: ticks run on a Tokio timer at a fixed or
//!   dynamic interval

mod manual;
mod scheduled;

pub use manual::ManualPollingStrategy;
pub use scheduled::{MIN_POLL_INTERVAL, PollInterval, ScheduledPollingStrategy};

use futures::future::BoxFuture;
use std::sync::Arc;

/// A callback asking its owner to poll once.
pub type Tick = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Decides when registered ticks run.
pub trait PollingStrategy: Send + Sync {
    /// Register a tick. It keeps running until the returned subscription is
    /// stopped or dropped.
    fn subscribe(&self, tick: Tick) -> Subscription;
}

/// Handle for a registered tick.
///
/// Stopping (or dropping) the subscription guarantees that no new tick is
/// started afterwards. A tick that is already running completes normally.
pub struct Subscription {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `stop` exactly once when stopped or dropped.
    pub fn new<F>(stop: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Stop the tick.
    pub fn stop(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_stops_once() {
        let stops = Arc::new(AtomicUsize::new(0));
        let stops_clone = Arc::clone(&stops);
        let subscription = Subscription::new(move || {
            stops_clone.fetch_add(1, Ordering::SeqCst);
        });

        subscription.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_stops_on_drop() {
        let stops = Arc::new(AtomicUsize::new(0));
        let stops_clone = Arc::clone(&stops);
        {
            let _subscription = Subscription::new(move || {
                stops_clone.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
