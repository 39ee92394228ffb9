//! Immutable snapshots and the lock-free store that publishes them.

use crate::core::PropertyReader;
use crate::sources::RawProperties;
use arc_swap::ArcSwap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;

/// An immutable merged view of all sources at one point in time.
///
/// Snapshots are never mutated after construction; every successful poll
/// produces a new one with an incremented version. The empty snapshot has
/// version `0` and is what readers see before the first successful poll.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    properties: RawProperties,
    version: u64,
    updated_at: Option<SystemTime>,
}

impl Snapshot {
    /// The empty snapshot published before the first successful poll.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from merged properties.
    pub fn new(properties: RawProperties, version: u64) -> Self {
        Self {
            properties,
            version,
            updated_at: Some(SystemTime::now()),
        }
    }

    /// Number of successful polls that led to this snapshot (`0` when empty).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether this snapshot came from a successful poll.
    pub fn is_initialized(&self) -> bool {
        self.version > 0
    }

    /// When this snapshot was published, `None` for the empty snapshot.
    pub fn updated_at(&self) -> Option<SystemTime> {
        self.updated_at
    }

    /// Number of properties in the snapshot.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check whether the snapshot holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Borrow a raw value without coercion.
    pub fn raw(&self, key: &str) -> Option<&config::Value> {
        self.properties.get(key)
    }

    /// Borrow all raw properties.
    pub fn properties(&self) -> &RawProperties {
        &self.properties
    }

    /// Keys added, removed or modified between `self` and `next`, sorted.
    ///
    /// Values are compared by kind only; the origin of a value does not
    /// count as a change.
    pub fn changed_keys(&self, next: &Snapshot) -> Vec<String> {
        let mut changed = BTreeSet::new();

        for (key, value) in &next.properties {
            match self.properties.get(key) {
                Some(old) if old.kind == value.kind => {}
                _ => {
                    changed.insert(key.clone());
                }
            }
        }

        for key in self.properties.keys() {
            if !next.properties.contains_key(key) {
                changed.insert(key.clone());
            }
        }

        changed.into_iter().collect()
    }
}

impl PropertyReader for Snapshot {
    fn get_value(&self, key: &str) -> Option<config::Value> {
        self.properties.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// The published snapshot together with the one it replaced.
#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    /// Snapshot readers currently see
    pub current: Arc<Snapshot>,
    /// Snapshot that was current before the last successful poll
    pub previous: Arc<Snapshot>,
}

/// Lock-free holder of the [`ConfigState`].
///
/// Both snapshots live behind a single `ArcSwap`, so a reader always sees a
/// complete state from before or after a replace, never a mix of the two.
pub struct SnapshotStore {
    state: ArcSwap<ConfigState>,
}

impl SnapshotStore {
    /// Create a store holding the empty snapshot.
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ConfigState::default()),
        }
    }

    /// The latest committed snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.load().current)
    }

    /// The snapshot that was current before the latest replace.
    pub fn previous(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.load().previous)
    }

    /// Current and previous snapshot as one consistent pair.
    pub fn state(&self) -> Arc<ConfigState> {
        self.state.load_full()
    }

    /// Atomically publish `next`, returning the snapshot it replaced.
    pub fn replace(&self, next: Arc<Snapshot>) -> Arc<Snapshot> {
        let old = self.state.rcu(|state| ConfigState {
            current: Arc::clone(&next),
            previous: Arc::clone(&state.current),
        });
        Arc::clone(&old.current)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
