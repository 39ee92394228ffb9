//! # polling-config
//!
//! Dynamic configuration kept fresh by polling, with lock-free snapshot reads.
//!
//! ## Overview
//!
//! `polling-config` periodically fetches key/value properties from one or
//! more sources, merges them and publishes the result atomically:
//! - Lock-free reads of an immutable [`Snapshot`](core::Snapshot) using `arc-swap`
//! - Ordered source precedence (later sources override earlier ones)
//! - Failed polls keep the last good snapshot and notify observers
//! - Per-key change notifications after every successful poll
//! - Pluggable polling strategies (timer-driven or manual)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polling_config::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> polling_config::error::Result<()> {
//! let config = PollingDynamicConfig::builder()
//!     .with_url("https://config.example.com/defaults.properties")
//!     .with_url("https://config.example.com/overrides.properties")
//!     .with_strategy(ScheduledPollingStrategy::fixed(Duration::from_secs(30)))
//!     .with_initial_poll(true)
//!     .build()
//!     .await?;
//!
//! // Lock-free reads of the latest snapshot
//! let port = config.get_i64_or("server.port", 8080)?;
//! println!("Server port: {}", port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `http` (default): remote `.properties` sources via `reqwest`
//! - `metrics`: OpenTelemetry poll metrics
//!
//! ```toml
//! [dependencies]
//! polling-config = { version = "0.1", features = ["metrics"] }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod polling;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        PollOutcome, PollState, PollingConfigBuilder, PollingDynamicConfig, PollingSettings,
        PropertyReader, Snapshot,
    };
    pub use crate::error::{ConfigError, Result};
    pub use crate::notify::{ConfigObserver, ObserverFn};
    pub use crate::polling::{ManualPollingStrategy, PollingStrategy, ScheduledPollingStrategy};
}
