//! Source reader that fetches and merges multiple property sources.

use crate::error::{ConfigError, Result};
use crate::sources::{PropertySource, RawProperties};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Fetches every configured source and merges the results.
///
/// Sources are merged in the order they were given: when two sources define
/// the same key, the source listed later wins. The reader is stateless
/// between fetches.
///
/// All sources are fetched concurrently. If any of them fails, the whole
/// fetch fails with the error of the first failing source in list order, so
/// the reported error does not depend on which request finished first.
pub struct SourceReader {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl SourceReader {
    /// Create a reader over an ordered list of sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSources`] if `sources` is empty.
    pub fn new(sources: Vec<Arc<dyn PropertySource>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(Self { sources })
    }

    /// Create a reader over a single source.
    pub fn single<S: PropertySource + 'static>(source: S) -> Self {
        Self {
            sources: vec![Arc::new(source)],
        }
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always `false`: a reader holds at least one source.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Get the list of source names in precedence order (lowest first).
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch all sources and merge them into one map.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing source in list order. No
    /// partial merge is returned.
    pub async fn fetch(&self) -> Result<RawProperties> {
        let results = join_all(self.sources.iter().map(|source| source.fetch())).await;

        let mut fetched = Vec::with_capacity(results.len());
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(properties) => fetched.push(properties),
                Err(e) => {
                    debug!(source = %source.name(), error = %e, "Source fetch failed");
                    return Err(e);
                }
            }
        }

        Ok(merge(fetched))
    }
}

/// Merge property maps in order; later maps override earlier ones.
pub fn merge<I>(maps: I) -> RawProperties
where
    I: IntoIterator<Item = RawProperties>,
{
    let mut merged = HashMap::new();
    for map in maps {
        merged.extend(map);
    }
    merged
}
