//! Failure routing configuration

use crate::severity::SeverityMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default dedup window for failure records
pub const DEFAULT_RECORD_TTL_SECONDS: u64 = 900;

/// Configuration for the failure router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRouterConfig {
    /// Dedup window in seconds; equivalent failures inside it coalesce
    pub record_ttl_seconds: u64,
    /// Static severity assignment
    pub severity: SeverityMap,
}

impl FaultRouterConfig {
    /// Create a configuration with the default dedup window and severity map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dedup window in seconds.
    #[must_use]
    pub const fn with_record_ttl_seconds(mut self, seconds: u64) -> Self {
        self.record_ttl_seconds = seconds;
        self
    }

    /// Replace the severity map.
    #[must_use]
    pub fn with_severity_map(mut self, severity: SeverityMap) -> Self {
        self.severity = severity;
        self
    }

    /// Dedup window as a [`Duration`].
    pub const fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_seconds)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.record_ttl_seconds == 0 {
            return Err("record_ttl_seconds must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for FaultRouterConfig {
    fn default() -> Self {
        Self {
            record_ttl_seconds: DEFAULT_RECORD_TTL_SECONDS,
            severity: SeverityMap::default(),
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
    fn test_defaults() {
        let config = FaultRouterConfig::new();
        assert_eq!(config.record_ttl(), Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = FaultRouterConfig::new()
            .with_record_ttl_seconds(0)
            .validate()
            .expect_err("zero window should be rejected");
        assert!(err.contains("record_ttl_seconds"));
    }
}
