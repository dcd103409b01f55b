//! Failure reports and records
//!
//! A [`FailureReport`] is the raw event handed to the router by a caller
//! whose retries ran out. A [`FailureRecord`] is the persisted, deduplicated
//! form: one record per live `(service, operation, error kind)` triple,
//! identified by a digest prefix in the same shape as cache keys.

use crate::severity::Severity;
use ballast_retry::ErrorKind;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Number of hex characters of the triple digest kept in a dedup hash.
pub const DEDUP_HASH_LEN: usize = 16;

/// Derive the dedup hash for a `(service, operation, error kind)` triple.
///
/// Deterministic: equivalent failures always map to the same hash, which is
/// what makes cross-process deduplication in a shared store possible. The
/// kind contributes its stable snake_case name, so hashes survive enum
/// reordering.
pub fn dedup_hash(service: &str, operation: &str, kind: ErrorKind) -> String {
    let triple = format!("{service}:{operation}:{}", kind.as_str());
    let mut digest = hex::encode(Sha256::digest(triple.as_bytes()));
    digest.truncate(DEDUP_HASH_LEN);
    digest
}

/// One terminal failure observed by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Downstream service that failed
    pub service: String,
    /// Logical operation that was attempted, e.g. `"query"`
    pub operation: String,
    /// Classified failure kind
    pub kind: ErrorKind,
    /// Free-form diagnostic context carried into the record
    pub context: HashMap<String, String>,
}

impl FailureReport {
    /// Create a report with empty context.
    pub fn new(service: impl Into<String>, operation: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            kind,
            context: HashMap::new(),
        }
    }

    /// Attach one context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The dedup hash of this report's triple.
    pub fn dedup_hash(&self) -> String {
        dedup_hash(&self.service, &self.operation, self.kind)
    }
}

/// Persisted, deduplicated failure state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Unique id of this record instance
    pub id: Uuid,
    /// Digest of the `(service, operation, error kind)` triple
    pub dedup_hash: String,
    /// Severity assigned when the record was created
    pub severity: Severity,
    /// Downstream service that failed
    pub service: String,
    /// Logical operation that was attempted
    pub operation: String,
    /// Classified failure kind
    pub error_kind: ErrorKind,
    /// Diagnostic context from the first report
    pub context: HashMap<String, String>,
    /// When the first equivalent failure was observed
    pub first_seen_at: DateTime<Utc>,
    /// How many equivalent failures arrived while the record was live
    pub occurrence_count: u64,
    /// When the record stops deduplicating and may be purged
    pub expires_at: DateTime<Utc>,
    /// Whether this record has already produced a notification
    pub notified: bool,
}

impl FailureRecord {
    /// Create a fresh record for `report` with a TTL from now.
    pub fn new(report: &FailureReport, severity: Severity, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            dedup_hash: report.dedup_hash(),
            severity,
            service: report.service.clone(),
            operation: report.operation.clone(),
            error_kind: report.kind,
            context: report.context.clone(),
            first_seen_at: Utc::now(),
            occurrence_count: 1,
            expires_at: expiry(ttl),
            notified: false,
        }
    }

    /// Whether the dedup window has closed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Count another equivalent failure and reopen the dedup window.
    pub fn observe_again(&mut self, ttl: Duration) {
        self.occurrence_count = self.occurrence_count.saturating_add(1);
        self.expires_at = expiry(ttl);
    }
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
