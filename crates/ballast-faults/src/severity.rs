//! Failure severity
//!
//! Severity is assigned from a static `(service, error kind)` mapping loaded
//! at startup, never inferred from error text. Only [`Severity::High`] and
//! [`Severity::Critical`] failures notify operators.

use ballast_retry::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How urgently a failure needs operator attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Expected noise, recorded only
    Low,
    /// Worth a look during business hours
    Medium,
    /// Needs attention soon
    High,
    /// Needs attention now
    Critical,
}

impl Severity {
    /// Stable lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether failures at this severity notify operators.
    pub const fn should_notify(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One severity assignment rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    /// Downstream service the rule applies to
    pub service: String,
    /// Failure kind the rule applies to
    pub kind: ErrorKind,
    /// Severity assigned when both match
    pub severity: Severity,
}

/// Static mapping of `(service, error kind)` to severity.
///
/// Lookup is exact-match over the rules with a configurable fallback;
/// first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityMap {
    /// Explicit assignment rules, checked in order
    pub rules: Vec<SeverityRule>,
    /// Severity for pairs without an explicit rule
    pub default_severity: Severity,
}

impl SeverityMap {
    /// Create an empty map that assigns [`Severity::Medium`] to everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment rule.
    #[must_use]
    pub fn add_rule(mut self, service: impl Into<String>, kind: ErrorKind, severity: Severity) -> Self {
        self.rules.push(SeverityRule {
            service: service.into(),
            kind,
            severity,
        });
        self
    }

    /// Replace the fallback severity.
    #[must_use]
    pub const fn with_default_severity(mut self, severity: Severity) -> Self {
        self.default_severity = severity;
        self
    }

    /// Resolve the severity for a `(service, kind)` pair.
    pub fn severity_for(&self, service: &str, kind: ErrorKind) -> Severity {
        self.rules
            .iter()
            .find(|rule| rule.service == service && rule.kind == kind)
            .map_or(self.default_severity, |rule| rule.severity)
    }
}

impl Default for SeverityMap {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_severity: Severity::Medium,
        }
    }
}
