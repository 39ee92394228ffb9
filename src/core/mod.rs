//! Core polling configuration types.

mod builder;
mod loader;
mod polling_config;
mod reader;
mod settings;
mod snapshot;

pub use builder::{DEFAULT_POLL_INTERVAL, PollingConfigBuilder};
pub use loader::{SourceReader, merge};
pub use polling_config::{PollOutcome, PollState, PollingDynamicConfig};
pub use reader::PropertyReader;
pub use settings::PollingSettings;
pub use snapshot::{ConfigState, Snapshot, SnapshotStore};
