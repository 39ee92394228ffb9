//! Error types for polling-config.

/// Result type alias for polling-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when fetching or reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source answered with a non-success status.
    #[error("Source '{endpoint}' responded with status {status}")]
    Status {
        /// Name of the failing source
        endpoint: String,
        /// Status code returned by the source
        status: u16,
    },

    /// A source could not be reached or read.
    #[error("Source '{endpoint}' is unavailable: {reason}")]
    Unavailable {
        /// Name of the failing source
        endpoint: String,
        /// Transport or I/O failure description
        reason: String,
    },

    /// A source returned a body that could not be parsed.
    #[error("Source '{endpoint}' returned a malformed body at line {line}: {reason}")]
    Malformed {
        /// Name of the failing source
        endpoint: String,
        /// 1-based line number of the offending entry
        line: usize,
        /// What was wrong with the entry
        reason: String,
    },

    /// A typed read without a default found no value for the key.
    #[error("Property '{0}' not found")]
    NotFound(String),

    /// A value exists but cannot be coerced into the requested type.
    #[error("Property '{key}' has an incompatible type: {reason}")]
    TypeMismatch {
        /// The property key
        key: String,
        /// Coercion failure description
        reason: String,
    },

    /// A reader was constructed without any sources.
    #[error("No configuration sources specified")]
    NoSources,

    /// A source could not be constructed.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Polling settings could not be loaded.
    #[error("Failed to load polling settings: {0}")]
    Settings(String),

    /// The poll requested during build failed.
    #[error("Initial poll failed: {0}")]
    InitialPoll(Box<ConfigError>),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Returns `true` for failures raised while fetching a source.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Unavailable { .. } | Self::Malformed { .. }
        )
    }

    /// Name of the source that failed, for fetch errors.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Status { endpoint, .. }
            | Self::Unavailable { endpoint, .. }
            | Self::Malformed { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Settings(err.to_string())
    }
}
