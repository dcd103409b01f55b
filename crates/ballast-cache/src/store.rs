//! Remote store abstraction
//!
//! The distributed tier talks to its backing store through [`RemoteStore`],
//! keeping the cache logic independent of the concrete backend. The store
//! enforces TTL natively; callers never filter expired remote values.

use crate::error::CacheResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Backing store for the distributed cache tier.
///
/// Implementations must be safe to call from many tasks at once. Expiry is
/// the store's responsibility: a value whose TTL has passed is never
/// returned.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a raw value.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a raw value with a native TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Remove a key if present.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Cheap liveness probe.
    async fn ping(&self) -> CacheResult<()>;
}

/// In-process [`RemoteStore`] for tests and single-node deployments.
///
/// Values expire lazily on read; this store is never shared across
/// processes, so it only stands in for the real distributed backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, (Vec<u8>, Instant)>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired ones included until read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw stored bytes for a key, ignoring expiry. Test hook.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|entry| entry.0.clone())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if Instant::now() >= *expires_at {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .set("k", b"value".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");

        assert_eq!(
            store.get("k").await.expect("get should succeed"),
            Some(b"value".to_vec())
        );

        store.delete("k").await.expect("delete should succeed");
        assert_eq!(store.get("k").await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_memory_store_expires() {
        let store = MemoryStore::new();
        store
            .set("k", b"value".to_vec(), Duration::from_millis(20))
            .await
            .expect("set should succeed");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get("k").await.expect("get should succeed"), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_ping() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());
    }
}
