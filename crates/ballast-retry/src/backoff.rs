//! Backoff computation
//!
//! Pure delay math, separated from the executor so schedules can be tested
//! without a clock. All values are milliseconds, matching the policy fields.

use crate::policy::{RetryPolicy, Strategy};
use rand::{RngExt, rng};

/// Deterministic delay before the retry that follows `failed_attempt`.
///
/// `failed_attempt` is 1-based: after the first attempt fails, the delay for
/// attempt 2 is computed with `failed_attempt = 1`. Jitter is not applied
/// here; callers draw it with [`full_jitter_ms`] when the policy asks for it.
pub fn delay_ms_for_attempt(policy: &RetryPolicy, failed_attempt: u32) -> u64 {
    let n = failed_attempt.max(1);
    match policy.strategy {
        Strategy::Fixed => policy.base_delay_ms,
        Strategy::Linear => policy.base_delay_ms.saturating_mul(u64::from(n)),
        Strategy::Exponential | Strategy::ExponentialJittered => {
            // Shift bounded to keep doubling saturating rather than wrapping.
            let doublings = (n - 1).min(63);
            policy
                .base_delay_ms
                .saturating_mul(1_u64 << doublings)
                .min(policy.max_delay_ms)
        }
    }
}

/// Draw a jittered delay uniformly from `[0, delay_ms]`.
pub fn full_jitter_ms(delay_ms: u64) -> u64 {
    rng().random_range(0..=delay_ms)
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy(strategy: Strategy) -> RetryPolicy {
        RetryPolicy::new("test")
            .with_strategy(strategy)
            .with_base_delay_ms(100)
            .with_max_delay_ms(1_000)
            .with_jitter(false)
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = policy(Strategy::Fixed);
        assert_eq!(delay_ms_for_attempt(&policy, 1), 100);
        assert_eq!(delay_ms_for_attempt(&policy, 7), 100);
    }

    #[test]
    fn test_linear_delay_grows_by_base() {
        let policy = policy(Strategy::Linear);
        assert_eq!(delay_ms_for_attempt(&policy, 1), 100);
        assert_eq!(delay_ms_for_attempt(&policy, 2), 200);
        assert_eq!(delay_ms_for_attempt(&policy, 3), 300);
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let policy = policy(Strategy::Exponential);
        assert_eq!(delay_ms_for_attempt(&policy, 1), 100);
        assert_eq!(delay_ms_for_attempt(&policy, 2), 200);
        assert_eq!(delay_ms_for_attempt(&policy, 3), 400);
        assert_eq!(delay_ms_for_attempt(&policy, 4), 800);
        assert_eq!(delay_ms_for_attempt(&policy, 5), 1_000);
        assert_eq!(delay_ms_for_attempt(&policy, 64), 1_000);
    }

    #[test]
    fn test_jittered_strategy_uses_exponential_schedule() {
        let jittered = policy(Strategy::ExponentialJittered);
        let plain = policy(Strategy::Exponential);
        for attempt in 1..6 {
            assert_eq!(
                delay_ms_for_attempt(&jittered, attempt),
                delay_ms_for_attempt(&plain, attempt)
            );
        }
    }

    #[test]
    fn test_huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::new("test")
            .with_strategy(Strategy::Exponential)
            .with_base_delay_ms(u64::MAX / 2)
            .with_max_delay_ms(u64::MAX);
        assert_eq!(delay_ms_for_attempt(&policy, u32::MAX), u64::MAX);
    }

    #[test]
    fn test_full_jitter_stays_within_bounds() {
        for _ in 0..200 {
            assert!(full_jitter_ms(400) <= 400);
        }
        assert_eq!(full_jitter_ms(0), 0);
    }
}
