//! Failure record persistence
//!
//! The router persists records through the [`FailureStore`] seam so the
//! backing system stays swappable. [`MemoryFailureStore`] serves tests and
//! single-node deployments; the Redis implementation lives in
//! [`crate::redis`].

use crate::error::FaultResult;
use crate::record::FailureRecord;
use async_trait::async_trait;
use dashmap::DashMap;

/// Persistence backend for deduplicated failure records.
///
/// Records are keyed by dedup hash; the store is expected to expire them at
/// `expires_at` (natively or lazily). All operations are best-effort from the
/// router's point of view.
#[async_trait]
pub trait FailureStore: Send + Sync {
    /// Insert or replace the record under its dedup hash.
    async fn upsert(&self, record: &FailureRecord) -> FaultResult<()>;

    /// Fetch the live record for `dedup_hash`, if any.
    async fn find_by_hash(&self, dedup_hash: &str) -> FaultResult<Option<FailureRecord>>;
}

/// In-process [`FailureStore`] over a concurrent map.
///
/// Expiry is lazy: an expired record is dropped on the lookup that finds it.
#[derive(Debug, Default)]
pub struct MemoryFailureStore {
    records: DashMap<String, FailureRecord>,
}

impl MemoryFailureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, including not-yet-purged expired ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FailureStore for MemoryFailureStore {
    async fn upsert(&self, record: &FailureRecord) -> FaultResult<()> {
        self.records
            .insert(record.dedup_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_by_hash(&self, dedup_hash: &str) -> FaultResult<Option<FailureRecord>> {
        if let Some(entry) = self.records.get(dedup_hash) {
            if !entry.is_expired() {
                return Ok(Some(entry.clone()));
            }
        }
        // Drop the expired record outside the shard guard.
        self.records
            .remove_if(dedup_hash, |_, record| record.is_expired());
        Ok(None)
    }
}
