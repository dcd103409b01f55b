//! Pool error types

use thiserror::Error;

/// Errors from pool configuration, acquisition, and client construction.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No pool is configured for the requested service
    #[error("No pool configured for service '{0}'")]
    UnknownService(String),

    /// Configuration failed validation
    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    /// No client became available within the acquisition deadline.
    ///
    /// The pool is at capacity and nothing was released in time. Callers
    /// should treat this as transient and retryable.
    #[error("Pool for service '{service}' exhausted after {timeout_ms}ms")]
    Exhausted {
        /// Service whose pool was saturated
        service: String,
        /// How long the caller waited
        timeout_ms: u64,
    },

    /// Building a new client for the pool failed
    #[error("Failed to connect client for service '{service}': {reason}")]
    Connect {
        /// Service the client was being built for
        service: String,
        /// Underlying failure description
        reason: String,
    },
}

impl PoolError {
    /// Convenience constructor for [`PoolError::Exhausted`].
    pub fn exhausted(service: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Exhausted {
            service: service.into(),
            timeout_ms,
        }
    }

    /// Convenience constructor for [`PoolError::Connect`].
    pub fn connect(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry after this error.
    ///
    /// Exhaustion and connect failures are load or connectivity conditions
    /// that can clear; the other variants are wiring mistakes.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Connect { .. })
    }
}

/// Result alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display_includes_context() {
        let err = PoolError::exhausted("search-api", 1000);
        assert_eq!(
            err.to_string(),
            "Pool for service 'search-api' exhausted after 1000ms"
        );

        let err = PoolError::connect("transcribe", "dns lookup failed");
        assert!(err.to_string().contains("transcribe"));
        assert!(err.to_string().contains("dns lookup failed"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PoolError::exhausted("s", 100).is_retryable());
        assert!(PoolError::connect("s", "refused").is_retryable());
        assert!(!PoolError::UnknownService("s".to_string()).is_retryable());
        assert!(!PoolError::InvalidConfiguration("bad".to_string()).is_retryable());
    }
}
