//! Failure classification
//!
//! Retry decisions are made from a closed set of error kinds, never from
//! message text. Downstream error types implement [`Classify`] to report
//! their kind; the [`ErrorKind`] to [`Disposition`] mapping is exhaustive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Closed taxonomy of downstream failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rate limited by the downstream service
    Throttled,
    /// Request or connect deadline elapsed
    Timeout,
    /// Connection could not be established or was dropped
    ConnectionFailed,
    /// Service reported itself temporarily unavailable
    Unavailable,
    /// No pooled client could be acquired in time
    PoolExhausted,
    /// Credentials rejected
    Unauthorized,
    /// Request payload rejected as invalid
    MalformedInput,
    /// Requested entity does not exist
    NotFound,
    /// Downstream bug or unclassified server error
    Internal,
}

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient; retry under the policy's schedule
    Retryable,
    /// Permanent; retrying cannot succeed
    Fatal,
}

impl ErrorKind {
    /// Map this kind to its retry disposition.
    pub const fn disposition(self) -> Disposition {
        match self {
            Self::Throttled
            | Self::Timeout
            | Self::ConnectionFailed
            | Self::Unavailable
            | Self::PoolExhausted => Disposition::Retryable,
            Self::Unauthorized | Self::MalformedInput | Self::NotFound | Self::Internal => {
                Disposition::Fatal
            }
        }
    }

    /// Whether this kind is worth another attempt.
    pub const fn is_retryable(self) -> bool {
        matches!(self.disposition(), Disposition::Retryable)
    }

    /// Stable lowercase name, matching the serialized form.
    ///
    /// Used wherever a kind becomes part of an identifier, so renaming a
    /// variant does not silently change derived hashes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Throttled => "throttled",
            Self::Timeout => "timeout",
            Self::ConnectionFailed => "connection_failed",
            Self::Unavailable => "unavailable",
            Self::PoolExhausted => "pool_exhausted",
            Self::Unauthorized => "unauthorized",
            Self::MalformedInput => "malformed_input",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by error types that can report their failure kind.
pub trait Classify {
    /// The kind of this failure.
    fn kind(&self) -> ErrorKind;

    /// Server-provided delay hint, e.g. from a `Retry-After` header.
    ///
    /// When present, the executor uses it in place of the computed backoff
    /// for the next attempt, capped at the policy's `max_delay_ms`.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
