//! Retry execution
//!
//! [`RetryExecutor`] drives an async operation through its policy's attempt
//! schedule. The operation is a closure so each attempt can rebuild its
//! request from scratch; between attempts the executor suspends only the
//! calling invocation with `tokio::time::sleep`.

use crate::backoff::{delay_ms_for_attempt, full_jitter_ms};
use crate::classify::{Classify, Disposition};
use crate::error::{InvalidPolicy, RetryError};
use crate::policy::{PolicySet, RetryPolicy};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Policy-driven retry loop over async operations.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policies: PolicySet,
}

impl RetryExecutor {
    /// Create an executor from a validated policy set.
    ///
    /// # Errors
    /// Returns [`InvalidPolicy`] if any policy in the set fails validation.
    pub fn new(policies: PolicySet) -> Result<Self, InvalidPolicy> {
        policies.validate().map_err(InvalidPolicy::new)?;
        Ok(Self { policies })
    }

    /// The configured policies.
    pub const fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Resolve the policy used for `service`.
    pub fn policy_for(&self, service: &str) -> &RetryPolicy {
        self.policies.policy_for(service)
    }

    /// Run `operation` under the policy configured for `service`.
    ///
    /// # Errors
    /// Returns [`RetryError::Fatal`] when a fatal failure stops the loop and
    /// [`RetryError::Exhausted`] when every allowed attempt failed.
    pub async fn execute<F, Fut, T, E>(
        &self,
        service: &str,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Classify + 'static,
    {
        Self::execute_with_policy(self.policy_for(service), operation).await
    }

    /// Run `operation` under an explicit policy.
    ///
    /// # Errors
    /// Returns [`RetryError::Fatal`] when a fatal failure stops the loop and
    /// [`RetryError::Exhausted`] when every allowed attempt failed.
    pub async fn execute_with_policy<F, Fut, T, E>(
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Classify + 'static,
    {
        let mut total_delay_ms = 0_u64;
        let mut attempt = 0_u32;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            service = %policy.service,
                            attempt,
                            "operation recovered after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let kind = err.kind();
            match kind.disposition() {
                Disposition::Fatal => {
                    debug!(
                        service = %policy.service,
                        attempt,
                        kind = %kind,
                        error = %err,
                        "fatal failure, not retrying"
                    );
                    return Err(RetryError::Fatal {
                        attempts: attempt,
                        total_delay_ms,
                        source: err,
                    });
                }
                Disposition::Retryable if attempt >= policy.max_attempts => {
                    warn!(
                        service = %policy.service,
                        attempts = attempt,
                        total_delay_ms,
                        kind = %kind,
                        error = %err,
                        "retries exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        total_delay_ms,
                        source: err,
                    });
                }
                Disposition::Retryable => {
                    let delay_ms = next_delay_ms(policy, attempt, err.retry_after());
                    warn!(
                        service = %policy.service,
                        attempt,
                        delay_ms,
                        kind = %kind,
                        error = %err,
                        "attempt failed, will retry"
                    );
                    total_delay_ms += delay_ms;
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Delay before the attempt that follows `failed_attempt`.
///
/// A server-provided hint takes precedence over the computed backoff and is
/// capped at the policy maximum. Jitter applies only to computed delays.
fn next_delay_ms(policy: &RetryPolicy, failed_attempt: u32, hint: Option<Duration>) -> u64 {
    if let Some(hint) = hint {
        let hint_ms = u64::try_from(hint.as_millis()).unwrap_or(u64::MAX);
        return hint_ms.min(policy.max_delay_ms);
    }
    let computed = delay_ms_for_attempt(policy, failed_attempt);
    if policy.jitter_enabled() {
        full_jitter_ms(computed)
    } else {
        computed
    }
}
