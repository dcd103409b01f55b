//! Retry policies
//!
//! A [`RetryPolicy`] names a backoff [`Strategy`] and its tuning for one
//! downstream service. Policies are grouped into a [`PolicySet`] that falls
//! back to a default policy for services without an explicit entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default attempt ceiling, counting the initial call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Default backoff cap in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Backoff shape applied between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Same delay before every retry
    Fixed,
    /// Delay grows by the base amount on each retry
    Linear,
    /// Delay doubles on each retry, capped at the policy maximum
    Exponential,
    /// Exponential growth with full jitter, regardless of the jitter flag
    ExponentialJittered,
}

impl Strategy {
    /// Stable lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::ExponentialJittered => "exponential_jittered",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry policy for one downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Downstream service name, e.g. `"search-api"`
    pub service: String,
    /// Backoff shape
    pub strategy: Strategy,
    /// Attempt ceiling, counting the initial call
    pub max_attempts: u32,
    /// Base delay in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
    /// Draw each delay uniformly from `[0, computed]`
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a policy for `service` with exponential backoff and jitter.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            strategy: Strategy::Exponential,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }

    /// Set the backoff shape.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the attempt ceiling.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay in milliseconds.
    #[must_use]
    pub const fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the delay cap in milliseconds.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Whether delays should be jittered under this policy.
    ///
    /// [`Strategy::ExponentialJittered`] always jitters; the other strategies
    /// honor the `jitter` flag.
    pub const fn jitter_enabled(&self) -> bool {
        self.jitter || matches!(self.strategy, Strategy::ExponentialJittered)
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), String> {
        if self.service.is_empty() {
            return Err("retry policy service name must not be empty".to_string());
        }
        if self.max_attempts == 0 {
            return Err(format!(
                "service '{}': max_attempts must be greater than zero",
                self.service
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(format!(
                "service '{}': max_delay_ms ({}) must not be below base_delay_ms ({})",
                self.service, self.max_delay_ms, self.base_delay_ms
            ));
        }
        Ok(())
    }
}

/// Collection of per-service policies with a default fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Policies for explicitly configured services
    pub policies: Vec<RetryPolicy>,
    /// Policy applied to services without an explicit entry
    pub default_policy: RetryPolicy,
}

impl PolicySet {
    /// Create a policy set with only the built-in default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a per-service policy.
    #[must_use]
    pub fn add_policy(mut self, policy: RetryPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Replace the fallback policy.
    #[must_use]
    pub fn with_default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Resolve the policy for `service`, falling back to the default.
    pub fn policy_for(&self, service: &str) -> &RetryPolicy {
        self.policies
            .iter()
            .find(|policy| policy.service == service)
            .unwrap_or(&self.default_policy)
    }

    /// Validate every policy plus the fallback, rejecting duplicates.
    pub fn validate(&self) -> Result<(), String> {
        self.default_policy.validate()?;
        for policy in &self.policies {
            policy.validate()?;
        }
        for (i, policy) in self.policies.iter().enumerate() {
            if self.policies[..i]
                .iter()
                .any(|other| other.service == policy.service)
            {
                return Err(format!(
                    "duplicate retry policy for service '{}'",
                    policy.service
                ));
            }
        }
        Ok(())
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            default_policy: RetryPolicy::new("default"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::new("search-api");
        assert_eq!(policy.strategy, Strategy::Exponential);
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.base_delay_ms, DEFAULT_BASE_DELAY_MS);
        assert_eq!(policy.max_delay_ms, DEFAULT_MAX_DELAY_MS);
        assert!(policy.jitter);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RetryPolicy::new("").validate().is_err());
        assert!(
            RetryPolicy::new("s")
                .with_max_attempts(0)
                .validate()
                .is_err()
        );
        assert!(
            RetryPolicy::new("s")
                .with_base_delay_ms(500)
                .with_max_delay_ms(100)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_jittered_strategy_overrides_flag() {
        let policy = RetryPolicy::new("s")
            .with_strategy(Strategy::ExponentialJittered)
            .with_jitter(false);
        assert!(policy.jitter_enabled());

        let plain = RetryPolicy::new("s")
            .with_strategy(Strategy::Exponential)
            .with_jitter(false);
        assert!(!plain.jitter_enabled());
    }

    #[test]
    fn test_policy_set_falls_back_to_default() {
        let set = PolicySet::new()
            .add_policy(RetryPolicy::new("search-api").with_max_attempts(5))
            .with_default_policy(RetryPolicy::new("default").with_max_attempts(2));

        assert_eq!(set.policy_for("search-api").max_attempts, 5);
        assert_eq!(set.policy_for("untuned-service").max_attempts, 2);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_policy_set_rejects_duplicates() {
        let set = PolicySet::new()
            .add_policy(RetryPolicy::new("search-api"))
            .add_policy(RetryPolicy::new("search-api"));
        let err = set.validate().expect_err("duplicate should be rejected");
        assert!(err.contains("search-api"));
    }

    #[test]
    fn test_strategy_serializes_snake_case() {
        let json = serde_json::to_string(&Strategy::ExponentialJittered).expect("serialize");
        assert_eq!(json, "\"exponential_jittered\"");

        let parsed: Strategy = serde_json::from_str("\"linear\"").expect("deserialize");
        assert_eq!(parsed, Strategy::Linear);
    }
}
