//! Property source trait.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Raw key/value properties fetched from exactly one source.
pub type RawProperties = HashMap<String, config::Value>;

/// Trait for sources polled by the configuration engine.
///
/// Implement this trait to plug in custom transports (e.g., a key-value store
/// or a database table). A source is fetched once per poll cycle and must not
/// keep state that changes what the engine publishes.
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Fetch the current properties of this source.
    ///
    /// An empty source yields an empty map, not an error.
    ///
    /// # Errors
    ///
    /// Returns a fetch error (`Status`, `Unavailable` or `Malformed`) if the
    /// source cannot be read or its content cannot be parsed.
    async fn fetch(&self) -> Result<RawProperties>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}
