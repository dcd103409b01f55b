//! In-process cache tier
//!
//! A bounded LRU map guarded by a mutex. Critical sections are O(1) map and
//! list operations; the tier never performs I/O and never blocks on anything
//! but the lock, so it is safe on hot paths. TTL is enforced lazily on read,
//! with an optional background sweep purging expired entries that nobody
//! reads.

use crate::{
    entry::CacheEntry,
    error::{CacheError, CacheResult},
    stats::{CacheStats, TierMetrics},
};
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Bounded in-process cache with strict LRU eviction and per-entry TTL.
///
/// Inserting at capacity evicts exactly the least-recently-used entry; the
/// entry count never exceeds the configured bound. Recency is updated on
/// every successful read and write.
pub struct MemoryCache {
    entries: Arc<Mutex<LruCache<String, CacheEntry>>>,
    metrics: Arc<TierMetrics>,
    sweep_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MemoryCache {
    /// Create a cache bounded to `max_entries`.
    pub fn new(max_entries: usize) -> CacheResult<Self> {
        let capacity = NonZeroUsize::new(max_entries).ok_or_else(|| {
            CacheError::InvalidConfiguration("max_entries must be greater than zero".to_string())
        })?;

        Ok(Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            metrics: Arc::new(TierMetrics::default()),
            sweep_handle: None,
        })
    }

    /// Create a cache and start a background sweep purging expired entries.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_sweep(max_entries: usize, sweep_interval: Duration) -> CacheResult<Self> {
        let mut cache = Self::new(max_entries)?;
        if sweep_interval > Duration::ZERO {
            cache.start_sweep_task(sweep_interval);
        }
        Ok(cache)
    }

    fn start_sweep_task(&mut self, sweep_interval: Duration) {
        let entries = Arc::clone(&self.entries);
        let metrics = Arc::clone(&self.metrics);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            loop {
                ticker.tick().await;

                let mut guard = entries.lock();
                let expired: Vec<String> = guard
                    .iter()
                    .filter(|(_, entry)| entry.is_expired())
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in &expired {
                    guard.pop(key.as_str());
                }
                drop(guard);

                if !expired.is_empty() {
                    metrics.record_expirations(expired.len() as u64);
                    tracing::debug!(count = expired.len(), "swept expired cache entries");
                }
            }
        });

        self.sweep_handle = Some(handle);
    }

    /// Look up a key, returning `None` for absent or expired entries.
    ///
    /// An expired entry found here is removed, freeing its slot.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get_mut(key) else {
            drop(entries);
            self.metrics.record_miss();
            return None;
        };

        if entry.is_expired() {
            entries.pop(key);
            drop(entries);
            self.metrics.record_expirations(1);
            self.metrics.record_miss();
            return None;
        }

        entry.touch();
        let value = entry.value.clone();
        drop(entries);
        self.metrics.record_hit();
        Some(value)
    }

    /// Insert a value expiring `ttl` from now.
    ///
    /// At capacity this displaces exactly the least-recently-used entry.
    pub fn put(&self, key: impl Into<String>, value: Bytes, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl);

        let mut entries = self.entries.lock();
        let displaced = entries.push(key.clone(), entry);
        drop(entries);

        // push returns the old value for a same-key overwrite, which is not
        // an eviction.
        if let Some((displaced_key, _)) = displaced {
            if displaced_key != key {
                self.metrics.record_eviction();
                tracing::trace!(key = %displaced_key, "evicted least-recently-used entry");
            }
        }
    }

    /// Remove a key. Returns true if it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Remove every key starting with `prefix`. Returns the number removed.
    ///
    /// Scans the whole tier under the lock; intended for rare, targeted
    /// invalidation, not the request path.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key.as_str());
        }
        doomed.len()
    }

    /// Number of resident entries, expired ones included until collected.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Snapshot of this tier's counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len())
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .field("sweeping", &self.sweep_handle.is_some())
            .finish()
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweep_handle.take() {
            handle.abort();
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
    fn test_basic_operations() {
        let cache = MemoryCache::new(16).expect("cache should build");
        let ttl = Duration::from_secs(60);

        cache.put("ns:u1:aaaa", Bytes::from("one"), ttl);
        assert_eq!(cache.get("ns:u1:aaaa"), Some(Bytes::from("one")));
        assert_eq!(cache.get("ns:u1:bbbb"), None);
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate("ns:u1:aaaa"));
        assert!(!cache.invalidate("ns:u1:aaaa"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let cache = MemoryCache::new(2).expect("cache should build");
        let ttl = Duration::from_secs(60);

        cache.put("k", Bytes::from("old"), ttl);
        cache.put("k", Bytes::from("new"), ttl);
        assert_eq!(cache.get("k"), Some(Bytes::from("new")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = MemoryCache::new(3).expect("cache should build");
        let ttl = Duration::from_secs(60);

        for i in 0..10 {
            cache.put(format!("key-{i}"), Bytes::from("v"), ttl);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 7);
    }

    #[test]
    fn test_evicts_exactly_least_recently_used() {
        let cache = MemoryCache::new(2).expect("cache should build");
        let ttl = Duration::from_secs(60);

        cache.put("a", Bytes::from("1"), ttl);
        cache.put("b", Bytes::from("2"), ttl);

        // Reading "a" makes "b" the least recently used.
        assert_eq!(cache.get("a"), Some(Bytes::from("1")));

        cache.put("c", Bytes::from("3"), ttl);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(Bytes::from("1")));
        assert_eq!(cache.get("c"), Some(Bytes::from("3")));
    }

    #[tokio::test]
    async fn test_ttl_expiry_on_get() {
        let cache = MemoryCache::new(16).expect("cache should build");

        cache.put("short", Bytes::from("v"), Duration::from_millis(50));
        assert_eq!(cache.get("short"), Some(Bytes::from("v")));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("short"), None);
        // The expired entry was removed, freeing its slot.
        assert_eq!(cache.len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
    }

    #[tokio::test]
    async fn test_background_sweep_purges_unread_entries() {
        let cache = MemoryCache::with_sweep(16, Duration::from_millis(40))
            .expect("cache should build");

        cache.put("stale", Bytes::from("v"), Duration::from_millis(20));
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;

        // Never read, still gone.
        assert_eq!(cache.len(), 0);
        assert!(cache.stats().expirations >= 1);
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = MemoryCache::new(16).expect("cache should build");
        let ttl = Duration::from_secs(60);

        cache.put("ns:alice:1111", Bytes::from("a"), ttl);
        cache.put("ns:alice:2222", Bytes::from("b"), ttl);
        cache.put("ns:bob:3333", Bytes::from("c"), ttl);

        let removed = cache.invalidate_prefix("ns:alice:");
        assert_eq!(removed, 2);
        assert_eq!(cache.get("ns:alice:1111"), None);
        assert_eq!(cache.get("ns:bob:3333"), Some(Bytes::from("c")));
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(MemoryCache::new(1000).expect("cache should build"));
        let ttl = Duration::from_secs(60);
        let mut handles = Vec::new();

        for i in 0..10 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    let key = format!("key-{i}-{j}");
                    let value = Bytes::from(format!("value-{i}-{j}"));
                    cache.put(key.clone(), value.clone(), ttl);
                    assert_eq!(cache.get(&key), Some(value));
                }
            }));
        }

        for handle in handles {
            handle.await.expect("task should complete");
        }
        assert_eq!(cache.len(), 1000);
    }

    #[test]
    fn test_stats_counts() {
        let cache = MemoryCache::new(8).expect("cache should build");
        let ttl = Duration::from_secs(60);

        cache.put("k", Bytes::from("v"), ttl);
        let _ = cache.get("k");
        let _ = cache.get("k");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(MemoryCache::new(0).is_err());
    }
}
