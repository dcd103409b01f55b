//! Error types for failure routing

use thiserror::Error;

/// Errors that can occur while persisting or reporting failures.
///
/// Every variant is swallowed by the router after logging; routing is a side
/// channel and must never fail the original caller.
#[derive(Debug, Error)]
pub enum FaultError {
    /// Invalid routing configuration
    #[error("Invalid fault routing configuration: {0}")]
    InvalidConfiguration(String),

    /// Failure store could not be reached or refused the operation
    #[error("Failure store unavailable: {0}")]
    Store(String),

    /// A record could not be encoded or decoded
    #[error("Failure record serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Notification channel rejected the alert
    #[error("Notification failed: {0}")]
    Notification(String),
}

impl FaultError {
    /// Build a [`FaultError::Store`] from any displayable source.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    /// Build a [`FaultError::Notification`] from any displayable source.
    pub fn notification(err: impl std::fmt::Display) -> Self {
        Self::Notification(err.to_string())
    }
}

impl From<redis::RedisError> for FaultError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}

/// Result type alias for failure routing operations
pub type FaultResult<T> = Result<T, FaultError>;
