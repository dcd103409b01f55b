//! Cache statistics
//!
//! Counters are atomics updated on the hot path; snapshots are cheap copies
//! taken without stopping traffic, so related figures may be skewed by
//! in-flight operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of one in-process tier's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a live entry
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Entries pushed out by capacity pressure
    pub evictions: u64,
    /// Entries dropped because their TTL had passed
    pub expirations: u64,
    /// Entries currently resident
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of reads served from the cache, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Snapshot of the remote tier's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteStats {
    /// Reads served by the remote store
    pub hits: u64,
    /// Reads the remote store answered with absence
    pub misses: u64,
    /// Reads degraded to a miss by a store failure
    pub errors: u64,
    /// Writes swallowed after a store failure
    pub put_failures: u64,
}

/// Aggregate snapshot across both tiers.
#[derive(Debug, Clone, Default)]
pub struct HybridStats {
    /// Per-namespace in-process tier stats
    pub namespaces: HashMap<String, CacheStats>,
    /// Remote tier stats
    pub remote: RemoteStats,
    /// Remote hits copied into the in-process tier
    pub promotions: u64,
}

/// Atomic counters backing one in-process tier.
#[derive(Debug, Default)]
pub(crate) struct TierMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl TierMetrics {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Atomic counters backing the remote tier.
#[derive(Debug, Default)]
pub(crate) struct RemoteMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    put_failures: AtomicU64,
}

impl RemoteMetrics {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_put_failure(&self) {
        self.put_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RemoteStats {
        RemoteStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            put_failures: self.put_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((CacheStats::default().hit_rate()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tier_metrics_snapshot() {
        let metrics = TierMetrics::default();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_eviction();
        metrics.record_expirations(3);

        let snapshot = metrics.snapshot(7);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.expirations, 3);
        assert_eq!(snapshot.entries, 7);
    }

    #[test]
    fn test_remote_metrics_snapshot() {
        let metrics = RemoteMetrics::default();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_error();
        metrics.record_put_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            RemoteStats {
                hits: 1,
                misses: 1,
                errors: 1,
                put_failures: 1,
            }
        );
    }
}
