//! Error types for the resilience facade
//!
//! Component errors compose upward into [`CoreError`]; a caller of
//! [`cached_call`](crate::ResilientClient::cached_call) sees either a result
//! or one terminal [`CoreError::CallFailed`], never tier-level detail.

use ballast_cache::CacheError;
use ballast_faults::FaultError;
use ballast_pool::PoolError;
use ballast_retry::{Classify, ErrorKind, InvalidPolicy, RetryError};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// A classified failure from a downstream service.
///
/// Work closures passed to the facade return this type; its [`ErrorKind`]
/// drives both the retry decision and fault routing, so constructing it with
/// the right kind is the caller's one classification duty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DownstreamError {
    kind: ErrorKind,
    message: String,
    retry_after: Option<Duration>,
}

impl DownstreamError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Classify an HTTP status into an error.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(kind_for_status(status), message)
    }

    /// Attach a server-provided delay hint, e.g. from a `Retry-After` header.
    #[must_use]
    pub const fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// The classified kind.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Classify for DownstreamError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

impl From<reqwest::Error> for DownstreamError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::ConnectionFailed
        } else if let Some(status) = err.status() {
            kind_for_status(status)
        } else if err.is_decode() {
            ErrorKind::Internal
        } else {
            ErrorKind::ConnectionFailed
        };
        Self::new(kind, err.to_string())
    }
}

fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::Throttled,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::MalformedInput,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => ErrorKind::Unavailable,
        _ => ErrorKind::Internal,
    }
}

/// Failure of a single attempt inside the retry loop.
///
/// Pool acquisition and the downstream call itself both count as the
/// attempt; either failing classifies the whole attempt.
#[derive(Debug, Error)]
pub enum CallError {
    /// No pooled client could be obtained
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The downstream call failed
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl Classify for CallError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Pool(PoolError::Exhausted { .. }) => ErrorKind::PoolExhausted,
            Self::Pool(PoolError::Connect { .. }) => ErrorKind::ConnectionFailed,
            Self::Pool(_) => ErrorKind::Internal,
            Self::Downstream(err) => err.kind(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Pool(_) => None,
            Self::Downstream(err) => Classify::retry_after(err),
        }
    }
}

/// Errors surfaced by the resilience facade.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Aggregate configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Cache layer error that is not swallowed, e.g. an unknown namespace
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Pool layer error outside the retry loop, e.g. an unknown service
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Failure routing could not be set up
    #[error(transparent)]
    Fault(#[from] FaultError),

    /// Retry policies failed validation
    #[error(transparent)]
    RetryPolicy(#[from] InvalidPolicy),

    /// A downstream call ended in a terminal failure
    #[error("Call to '{service}' failed after {attempts} attempts ({total_delay_ms}ms of backoff)")]
    CallFailed {
        /// Service that was called
        service: String,
        /// Attempts made, counting the initial call
        attempts: u32,
        /// Total backoff slept in milliseconds
        total_delay_ms: u64,
        /// The last attempt's failure
        #[source]
        source: CallError,
    },
}

impl CoreError {
    /// Build a [`CoreError::CallFailed`] from a terminal retry error.
    pub fn call_failed(service: impl Into<String>, err: RetryError<CallError>) -> Self {
        Self::CallFailed {
            service: service.into(),
            attempts: err.attempts(),
            total_delay_ms: err.total_delay_ms(),
            source: err.into_inner(),
        }
    }
}

/// Result type alias for facade operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, ErrorKind::Throttled),
            (StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized),
            (StatusCode::FORBIDDEN, ErrorKind::Unauthorized),
            (StatusCode::BAD_REQUEST, ErrorKind::MalformedInput),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::GATEWAY_TIMEOUT, ErrorKind::Timeout),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Unavailable),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
        ];
        for (status, expected) in cases {
            let err = DownstreamError::from_status(status, "status check");
            assert_eq!(err.kind(), expected, "status {status}");
        }
    }

    #[test]
    fn test_retry_after_hint_is_exposed_through_classify() {
        let err = DownstreamError::new(ErrorKind::Throttled, "slow down")
            .with_retry_after(Duration::from_secs(2));
        assert_eq!(Classify::retry_after(&err), Some(Duration::from_secs(2)));

        let wrapped = CallError::from(err);
        assert_eq!(wrapped.kind(), ErrorKind::Throttled);
        assert_eq!(Classify::retry_after(&wrapped), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_pool_errors_classify_by_variant() {
        let exhausted = CallError::from(PoolError::exhausted("search-api", 1_000));
        assert_eq!(exhausted.kind(), ErrorKind::PoolExhausted);
        assert!(exhausted.kind().is_retryable());

        let connect = CallError::from(PoolError::connect("search-api", "refused"));
        assert_eq!(connect.kind(), ErrorKind::ConnectionFailed);

        let unknown = CallError::from(PoolError::UnknownService("mystery".to_string()));
        assert_eq!(unknown.kind(), ErrorKind::Internal);
        assert!(!unknown.kind().is_retryable());
    }

    #[test]
    fn test_call_failed_reports_attempt_accounting() {
        let terminal = RetryError::Exhausted {
            attempts: 4,
            total_delay_ms: 700,
            source: CallError::from(DownstreamError::new(ErrorKind::Timeout, "deadline")),
        };
        let err = CoreError::call_failed("search-api", terminal);
        let text = err.to_string();
        assert!(text.contains("search-api"));
        assert!(text.contains("4 attempts"));
        assert!(text.contains("700ms"));
    }
}
