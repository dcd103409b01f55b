//! Retry error types

use crate::classify::{Classify, ErrorKind};
use thiserror::Error;

/// Terminal outcome of a retried operation.
///
/// Both variants carry the attempt count and the total backoff spent, so
/// downstream reporting can distinguish "gave up after trying" from
/// "refused to try again".
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every allowed attempt failed with a retryable error.
    #[error("Retries exhausted after {attempts} attempts ({total_delay_ms}ms of backoff)")]
    Exhausted {
        /// Attempts made, counting the initial call
        attempts: u32,
        /// Total delay slept between attempts in milliseconds
        total_delay_ms: u64,
        /// The last failure observed
        #[source]
        source: E,
    },

    /// A fatal failure ended the attempt loop early.
    #[error("Fatal failure on attempt {attempts}")]
    Fatal {
        /// Attempts made, counting the initial call
        attempts: u32,
        /// Total delay slept between attempts in milliseconds
        total_delay_ms: u64,
        /// The failure that stopped the loop
        #[source]
        source: E,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Attempts made before giving up.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Fatal { attempts, .. } => *attempts,
        }
    }

    /// Total delay slept between attempts in milliseconds.
    pub const fn total_delay_ms(&self) -> u64 {
        match self {
            Self::Exhausted { total_delay_ms, .. } | Self::Fatal { total_delay_ms, .. } => {
                *total_delay_ms
            }
        }
    }

    /// Whether the policy's attempt ceiling was reached.
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Borrow the underlying failure.
    pub const fn inner(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::Fatal { source, .. } => source,
        }
    }

    /// Take the underlying failure.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Fatal { source, .. } => source,
        }
    }
}

impl<E> RetryError<E>
where
    E: std::error::Error + Classify + 'static,
{
    /// Kind of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        self.inner().kind()
    }
}

/// A retry policy or policy set failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid retry policy: {0}")]
pub struct InvalidPolicy(String);

impl InvalidPolicy {
    /// Wrap a validation message.
    pub const fn new(message: String) -> Self {
        Self(message)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Error)]
    #[error("downstream said no")]
    struct Downstream(ErrorKind);

    impl Classify for Downstream {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    #[test]
    fn test_accessors_cover_both_variants() {
        let exhausted = RetryError::Exhausted {
            attempts: 4,
            total_delay_ms: 700,
            source: Downstream(ErrorKind::Timeout),
        };
        assert_eq!(exhausted.attempts(), 4);
        assert_eq!(exhausted.total_delay_ms(), 700);
        assert!(exhausted.is_exhausted());
        assert_eq!(exhausted.kind(), ErrorKind::Timeout);

        let fatal = RetryError::Fatal {
            attempts: 1,
            total_delay_ms: 0,
            source: Downstream(ErrorKind::Unauthorized),
        };
        assert_eq!(fatal.attempts(), 1);
        assert!(!fatal.is_exhausted());
        assert_eq!(fatal.into_inner().0, ErrorKind::Unauthorized);
    }

    #[test]
    fn test_display_reports_attempt_counts() {
        let err = RetryError::Exhausted {
            attempts: 3,
            total_delay_ms: 300,
            source: Downstream(ErrorKind::Unavailable),
        };
        assert_eq!(
            err.to_string(),
            "Retries exhausted after 3 attempts (300ms of backoff)"
        );
        assert_eq!(
            std::error::Error::source(&err)
                .expect("source is attached")
                .to_string(),
            "downstream said no"
        );
    }
}
