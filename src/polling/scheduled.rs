//! Timer-driven polling on the Tokio runtime.

use super::{PollingStrategy, Subscription, Tick};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Shortest delay allowed between two ticks.
///
/// Shorter intervals, including zero, are raised to this value.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Delay between two consecutive ticks.
#[derive(Clone)]
pub enum PollInterval {
    /// The same delay every time
    Fixed(Duration),
    /// Delay computed again after every tick
    Dynamic(Arc<dyn Fn() -> Duration + Send + Sync>),
}

impl PollInterval {
    fn next_delay(&self) -> Duration {
        let delay = match self {
            Self::Fixed(period) => *period,
            Self::Dynamic(compute) => compute(),
        };
        delay.max(MIN_POLL_INTERVAL)
    }
}

impl fmt::Debug for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(period) => f.debug_tuple("Fixed").field(period).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Polling strategy driven by a timer.
///
/// Every subscription runs its own Tokio task: the first tick runs
/// immediately (or after the initial delay), then after each completed tick
/// the task waits for the next interval. Ticks of one subscription never
/// overlap.
///
/// Subscribing requires a running Tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::polling::ScheduledPollingStrategy;
/// use std::time::Duration;
///
/// let every_thirty_seconds = ScheduledPollingStrategy::fixed(Duration::from_secs(30))
///     .with_initial_delay(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ScheduledPollingStrategy {
    interval: PollInterval,
    initial_delay: Duration,
}

impl ScheduledPollingStrategy {
    /// Poll at a fixed interval, no shorter than [`MIN_POLL_INTERVAL`].
    pub fn fixed(period: Duration) -> Self {
        Self {
            interval: PollInterval::Fixed(period),
            initial_delay: Duration::ZERO,
        }
    }

    /// Poll at an interval recomputed after each tick, no shorter than
    /// [`MIN_POLL_INTERVAL`].
    pub fn dynamic<F>(next_delay: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        Self {
            interval: PollInterval::Dynamic(Arc::new(next_delay)),
            initial_delay: Duration::ZERO,
        }
    }

    /// Wait before the first tick instead of running it immediately.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// The configured interval.
    pub fn interval(&self) -> &PollInterval {
        &self.interval
    }

    /// The delay before the first tick.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}

/// Stop flag shared between a subscription and its timer task.
///
/// The flag is checked and the next tick started under the same lock, so
/// once `stop` has set it no further tick can begin.
struct TickControl {
    stopped: Mutex<bool>,
    wake: Notify,
}

impl TickControl {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_one();
    }
}

impl PollingStrategy for ScheduledPollingStrategy {
    fn subscribe(&self, tick: Tick) -> Subscription {
        let control = Arc::new(TickControl {
            stopped: Mutex::new(false),
            wake: Notify::new(),
        });

        let task_control = Arc::clone(&control);
        let interval = self.interval.clone();
        let mut delay = self.initial_delay;

        debug!(interval = ?interval, initial_delay = ?delay, "Starting scheduled polling");
        tokio::spawn(async move {
            loop {
                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::select! {
                        _ = task_control.wake.notified() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }

                let pending = {
                    let stopped = task_control.stopped.lock();
                    if *stopped {
                        break;
                    }
                    tick()
                };
                pending.await;

                delay = interval.next_delay();
            }
            debug!("Scheduled polling stopped");
        });

        Subscription::new(move || control.stop())
    }
}
