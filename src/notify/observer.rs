//! Observer trait and a closure-based implementation.

use crate::core::Snapshot;
use crate::error::ConfigError;

/// Receives configuration change and failure notifications.
///
/// All three callbacks default to no-ops, so an observer only implements the
/// slots it cares about. Callbacks run on the polling path; a callback that
/// panics is logged and does not prevent other observers from being
/// notified.
///
/// # Examples
///
/// ```rust
/// use polling_config::prelude::*;
///
/// struct PortWatcher;
///
/// impl ConfigObserver for PortWatcher {
///     fn on_key_update(&self, key: &str, snapshot: &Snapshot) {
///         if key == "server.port" {
///             println!("port is now {:?}", snapshot.get_i64("server.port"));
///         }
///     }
/// }
/// ```
pub trait ConfigObserver: Send + Sync {
    /// Called once per successful poll, after all per-key callbacks.
    fn on_update(&self, _snapshot: &Snapshot) {}

    /// Called once for every key added, removed or changed by a successful poll.
    fn on_key_update(&self, _key: &str, _snapshot: &Snapshot) {}

    /// Called once per failed poll with the unchanged last good snapshot.
    fn on_error(&self, _error: &ConfigError, _snapshot: &Snapshot) {}
}

type UpdateFn = Box<dyn Fn(&Snapshot) + Send + Sync>;
type KeyUpdateFn = Box<dyn Fn(&str, &Snapshot) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ConfigError, &Snapshot) + Send + Sync>;

/// An observer assembled from closures.
///
/// # Examples
///
/// ```rust
/// use polling_config::notify::ObserverFn;
///
/// let observer = ObserverFn::new()
///     .with_update(|snapshot| println!("now at version {}", snapshot.version()))
///     .with_error(|error, _| eprintln!("poll failed: {error}"));
/// ```
#[derive(Default)]
pub struct ObserverFn {
    update: Option<UpdateFn>,
    key_update: Option<KeyUpdateFn>,
    error: Option<ErrorFn>,
}

impl ObserverFn {
    /// Create an observer with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whole-config update callback.
    pub fn with_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.update = Some(Box::new(callback));
        self
    }

    /// Set the per-key update callback.
    pub fn with_key_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Snapshot) + Send + Sync + 'static,
    {
        self.key_update = Some(Box::new(callback));
        self
    }

    /// Set the error callback.
    pub fn with_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ConfigError, &Snapshot) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }
}

impl ConfigObserver for ObserverFn {
    fn on_update(&self, snapshot: &Snapshot) {
        if let Some(callback) = &self.update {
            callback(snapshot);
        }
    }

    fn on_key_update(&self, key: &str, snapshot: &Snapshot) {
        if let Some(callback) = &self.key_update {
            callback(key, snapshot);
        }
    }

    fn on_error(&self, error: &ConfigError, snapshot: &Snapshot) {
        if let Some(callback) = &self.error {
            callback(error, snapshot);
        }
    }
}
