//! Built-in metrics for polling operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Poll attempts/success/failures
//! - Poll duration
//! - Snapshot age
//! - Registered observers
//! - Observer callback failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use polling_config::prelude::*;
//! use polling_config::sources::MemorySource;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let config = PollingDynamicConfig::builder()
//!     .with_source(MemorySource::new("app"))
//!     .with_metrics(meter)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod poll_metrics;

pub use poll_metrics::PollMetrics;
