//! Cache entry metadata

use bytes::Bytes;
use std::time::{Duration, Instant};

/// A single cached value with its expiry bookkeeping.
///
/// Each tier owns its entries outright; the in-process and remote tiers hold
/// independent copies with independent expiry clocks. An entry is logically
/// absent once its expiry passes, regardless of physical presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cached value
    pub value: Bytes,
    /// Size of the value in bytes
    pub size_bytes: usize,
    /// When the entry was created
    pub created_at: Instant,
    /// When the entry expires
    pub expires_at: Instant,
    /// Last successful read, for recency tracking
    pub last_accessed: Instant,
}

impl CacheEntry {
    /// Create an entry expiring `ttl` from now.
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let size_bytes = value.len();
        Self {
            value,
            size_bytes,
            created_at: now,
            expires_at: now + ttl,
            last_accessed: now,
        }
    }

    /// True once the expiry has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Record a read.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    /// Time since creation.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Remaining lifetime, zero once expired.
    pub fn time_to_live(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
