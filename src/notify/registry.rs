//! Ordered registry of configuration observers.

use super::ConfigObserver;
use crate::core::Snapshot;
use crate::error::ConfigError;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Registry of observers notified after every poll.
///
/// Observers are kept in registration order and registered at most once
/// (by pointer identity). Dispatch works on a copy of the list, so callbacks
/// may add or remove observers without deadlocking.
///
/// # Examples
///
/// ```rust
/// use polling_config::notify::{ObserverFn, ObserverRegistry};
/// use polling_config::core::Snapshot;
/// use std::sync::Arc;
///
/// let registry = ObserverRegistry::new();
/// registry.add(Arc::new(ObserverFn::new().with_update(|_| println!("updated"))));
///
/// registry.notify_update(&Snapshot::empty(), &[]);
/// ```
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn ConfigObserver>>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer, returning `false` if it was already registered.
    pub fn add(&self, observer: Arc<dyn ConfigObserver>) -> bool {
        let mut observers = self.observers.write();
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Unregister an observer, returning whether it was registered.
    pub fn remove(&self, observer: &Arc<dyn ConfigObserver>) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    /// Get the number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Check whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every observer of a successful update.
    ///
    /// For each observer in registration order, `on_key_update` is called
    /// once per changed key, then `on_update` once. Returns the number of
    /// callbacks that panicked.
    pub fn notify_update(&self, snapshot: &Snapshot, changed_keys: &[String]) -> usize {
        let mut failures = 0;
        for (index, observer) in self.observers().iter().enumerate() {
            for key in changed_keys {
                if !dispatch(index, "on_key_update", || observer.on_key_update(key, snapshot)) {
                    failures += 1;
                }
            }
            if !dispatch(index, "on_update", || observer.on_update(snapshot)) {
                failures += 1;
            }
        }
        failures
    }

    /// Notify every observer of a failed poll.
    ///
    /// `last_good` is the snapshot that stays published. Returns the number
    /// of callbacks that panicked.
    pub fn notify_error(&self, error: &ConfigError, last_good: &Snapshot) -> usize {
        let mut failures = 0;
        for (index, observer) in self.observers().iter().enumerate() {
            if !dispatch(index, "on_error", || observer.on_error(error, last_good)) {
                failures += 1;
            }
        }
        failures
    }

    fn observers(&self) -> Vec<Arc<dyn ConfigObserver>> {
        self.observers.read().clone()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn same_observer(a: &Arc<dyn ConfigObserver>, b: &Arc<dyn ConfigObserver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Run one callback, logging instead of propagating a panic.
fn dispatch(index: usize, callback: &'static str, f: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            error!(
                observer = index,
                callback,
                panic = %panic_message(payload.as_ref()),
                "Configuration observer panicked; continuing with remaining observers"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
