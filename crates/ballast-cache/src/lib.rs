//! Two-tier caching for expensive downstream results
//!
//! This crate provides the caching layer of the ballast resilience stack: a
//! fast in-process LRU tier in front of a shared remote tier, coordinated per
//! data category (namespace).
//!
//! # Features
//!
//! - **Deterministic keys**: `namespace:principal:digest` derived from a
//!   normalized payload, so identical requests share an entry and principals
//!   never share entries
//! - **Strict in-process bound**: each namespace's local tier holds at most
//!   its configured number of entries, evicting least-recently-used first
//! - **Best-effort remote tier**: remote failures and timeouts degrade to
//!   cache misses; a cache outage slows the system down but never breaks it
//! - **Transparent compression**: large remote values are deflated, with a
//!   self-describing envelope so readers never depend on writer settings
//! - **Promotion**: remote hits are copied back into the in-process tier
//!
//! # Example
//!
//! ```no_run
//! use ballast_cache::{
//!     CacheNamespaceConfig, HybridCache, HybridCacheConfig, MemoryStore, RequestKey,
//! };
//! use bytes::Bytes;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ballast_cache::CacheError> {
//! let config = HybridCacheConfig::new()
//!     .add_namespace(CacheNamespaceConfig::new("retrieval-result").with_ttl_seconds(1800));
//! let cache = HybridCache::new(config, Arc::new(MemoryStore::new()))?;
//!
//! let key = RequestKey::build("retrieval-result", "user-42", "reset wifi");
//! cache.set(&key, Bytes::from_static(b"top articles")).await?;
//! assert!(cache.get(&key).await?.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod entry;
pub mod error;
pub mod hybrid;
pub mod key;
pub mod memory;
pub mod redis;
pub mod remote;
pub mod stats;
pub mod store;

pub use config::{
    CacheNamespaceConfig, DEFAULT_COMPRESSION_THRESHOLD, DEFAULT_MAX_ENTRIES,
    DEFAULT_REMOTE_TIMEOUT_MS, DEFAULT_SWEEP_INTERVAL_SECONDS, DEFAULT_TTL_SECONDS,
    HybridCacheConfig,
};
pub use entry::CacheEntry;
pub use error::{CacheError, CacheResult};
pub use hybrid::HybridCache;
pub use key::{KEY_DIGEST_LEN, RequestKey, normalize_payload};
pub use memory::MemoryCache;
pub use redis::RedisStore;
pub use remote::RemoteCache;
pub use stats::{CacheStats, HybridStats, RemoteStats};
pub use store::{MemoryStore, RemoteStore};
