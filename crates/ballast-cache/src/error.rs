//! Error types for cache operations

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Namespace is not present in the cache configuration
    #[error("Namespace not configured: {0}")]
    UnknownNamespace(String),

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// Remote store could not be reached or refused the operation
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    /// Remote operation exceeded its deadline
    #[error("Remote operation timed out after {timeout_ms} ms")]
    Timeout {
        /// Deadline that was exceeded
        timeout_ms: u64,
    },

    /// Compression of a value failed before storage
    #[error("Compression error: {0}")]
    Compression(String),

    /// Stored value could not be decoded
    #[error("Malformed stored value: {0}")]
    Corrupt(String),
}

impl CacheError {
    /// Build an [`CacheError::Unavailable`] from any displayable source.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// True for connectivity-class failures that the remote tier swallows.
    pub const fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout { .. } | Self::Corrupt(_)
        )
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
