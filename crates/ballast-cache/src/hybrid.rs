//! Two-tier cache coordinator
//!
//! [`HybridCache`] composes one in-process [`MemoryCache`] per configured
//! namespace with a single shared [`RemoteCache`]. Reads check the local tier
//! first, then the remote tier, promoting remote hits back into the local
//! tier so repeated reads stay in process. Writes go to both tiers
//! independently: the local write always succeeds, and the remote write is
//! best effort.
//!
//! Operations on a namespace that was not configured at construction return
//! [`CacheError::UnknownNamespace`] rather than silently missing, since that
//! is a wiring bug and not a cache miss.

use crate::{
    config::HybridCacheConfig,
    error::{CacheError, CacheResult},
    key::RequestKey,
    memory::MemoryCache,
    remote::RemoteCache,
    stats::HybridStats,
    store::RemoteStore,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// One namespace's in-process tier plus its policy.
struct NamespaceTier {
    local: MemoryCache,
    ttl: Duration,
    compress: bool,
}

/// Coordinator for the in-process and remote cache tiers.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct HybridCache {
    tiers: HashMap<String, NamespaceTier>,
    remote: RemoteCache,
    promotions: AtomicU64,
}

impl HybridCache {
    /// Build the cache from a validated configuration and a remote store.
    ///
    /// One in-process tier is created per configured namespace. Must be
    /// called within a Tokio runtime when the background sweep is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(config: HybridCacheConfig, store: Arc<dyn RemoteStore>) -> CacheResult<Self> {
        config.validate().map_err(CacheError::InvalidConfiguration)?;

        let sweep_interval = Duration::from_secs(config.sweep_interval_seconds);
        let mut tiers = HashMap::with_capacity(config.namespaces.len());
        for ns in &config.namespaces {
            let local = if config.sweep_interval_seconds == 0 {
                MemoryCache::new(ns.max_entries)?
            } else {
                MemoryCache::with_sweep(ns.max_entries, sweep_interval)?
            };
            tiers.insert(
                ns.namespace.clone(),
                NamespaceTier {
                    local,
                    ttl: ns.ttl(),
                    compress: ns.compress,
                },
            );
        }

        Ok(Self {
            tiers,
            remote: RemoteCache::new(store, &config),
            promotions: AtomicU64::new(0),
        })
    }

    /// Look up a cached value.
    ///
    /// Checks the in-process tier first, then the remote tier. A remote hit
    /// is promoted into the in-process tier with the namespace TTL. Remote
    /// failures degrade to a miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownNamespace`] if the key's namespace was
    /// not configured.
    pub async fn get(&self, key: &RequestKey) -> CacheResult<Option<Bytes>> {
        let tier = self.tier(key.namespace())?;
        let cache_key = key.as_cache_key();

        if let Some(value) = tier.local.get(cache_key) {
            return Ok(Some(value));
        }

        match self.remote.get(cache_key).await {
            Some(value) => {
                tier.local.put(cache_key, value.clone(), tier.ttl);
                self.promotions.fetch_add(1, Ordering::Relaxed);
                debug!(key = cache_key, "promoted remote hit into in-process tier");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Store a value in both tiers with the namespace TTL.
    ///
    /// The in-process write always succeeds; the remote write is best effort
    /// and never fails the call.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownNamespace`] if the key's namespace was
    /// not configured.
    pub async fn set(&self, key: &RequestKey, value: Bytes) -> CacheResult<()> {
        let tier = self.tier(key.namespace())?;
        let cache_key = key.as_cache_key();

        tier.local.put(cache_key, value.clone(), tier.ttl);
        self.remote
            .put(cache_key, &value, tier.ttl, tier.compress)
            .await;
        Ok(())
    }

    /// Remove a single key from both tiers.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownNamespace`] if the key's namespace was
    /// not configured.
    pub async fn invalidate(&self, key: &RequestKey) -> CacheResult<()> {
        let tier = self.tier(key.namespace())?;
        let cache_key = key.as_cache_key();

        tier.local.invalidate(cache_key);
        self.remote.invalidate(cache_key).await;
        Ok(())
    }

    /// Drop every in-process entry a principal has in a namespace.
    ///
    /// Only the in-process tier is scanned; remote entries for the principal
    /// age out through their TTL. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownNamespace`] if the namespace was not
    /// configured.
    pub fn invalidate_principal(&self, namespace: &str, principal: &str) -> CacheResult<usize> {
        let tier = self.tier(namespace)?;
        let prefix = RequestKey::principal_prefix(namespace, principal);
        Ok(tier.local.invalidate_prefix(&prefix))
    }

    /// Probe the remote store.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error if the probe fails or times out.
    pub async fn ping_remote(&self) -> CacheResult<()> {
        self.remote.ping().await
    }

    /// Names of the configured namespaces.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    /// Snapshot of every tier's counters.
    pub fn stats(&self) -> HybridStats {
        HybridStats {
            namespaces: self
                .tiers
                .iter()
                .map(|(name, tier)| (name.clone(), tier.local.stats()))
                .collect(),
            remote: self.remote.stats(),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }

    fn tier(&self, namespace: &str) -> CacheResult<&NamespaceTier> {
        self.tiers
            .get(namespace)
            .ok_or_else(|| CacheError::UnknownNamespace(namespace.to_string()))
    }
}

impl std::fmt::Debug for HybridCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridCache")
            .field("namespaces", &self.tiers.len())
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}
