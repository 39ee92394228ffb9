//! File-based property source.

use super::{PropertySource, RawProperties, properties};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// File-based property source.
///
/// Reads a `.properties` file on every fetch, so edits are picked up by the
/// next poll. A missing or unreadable file fails the fetch.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::sources::FileSource;
///
/// let source = FileSource::new("config/application.properties");
/// ```
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a new file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file backing this source.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl PropertySource for FileSource {
    async fn fetch(&self) -> Result<RawProperties> {
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ConfigError::Unavailable {
                endpoint: self.name(),
                reason: e.to_string(),
            })?;

        properties::parse_bytes(&self.name(), &body)
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
