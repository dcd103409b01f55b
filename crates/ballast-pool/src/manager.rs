//! Per-service pool manager
//!
//! Owns one [`ServicePool`] per configured downstream service. The service
//! map is built once at startup and never mutated, so lookups are lock-free
//! and a saturated pool for one service cannot take capacity from another.
//! A background task periodically runs each pool's idle maintenance.

use crate::client::{ClientFactory, PooledClient};
use crate::config::PoolManagerConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::{ClientGuard, PoolStatus, ServicePool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// One pool per downstream service, behind a single acquire surface.
pub struct ConnectionPoolManager<C: PooledClient> {
    pools: HashMap<String, Arc<ServicePool<C>>>,
    maintenance_handle: Option<JoinHandle<()>>,
}

impl<C: PooledClient> ConnectionPoolManager<C> {
    /// Build pools for every configured service, sharing one factory.
    ///
    /// Must be called within a Tokio runtime when the maintenance interval
    /// is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(
        config: PoolManagerConfig,
        factory: Arc<dyn ClientFactory<Client = C>>,
    ) -> PoolResult<Self> {
        config
            .validate()
            .map_err(PoolError::InvalidConfiguration)?;

        let mut pools = HashMap::with_capacity(config.pools.len());
        for pool_config in &config.pools {
            let pool = ServicePool::new(pool_config.clone(), Arc::clone(&factory))?;
            pools.insert(pool_config.service.clone(), Arc::new(pool));
        }

        let maintenance_handle = if config.reclaim_interval_seconds == 0 {
            None
        } else {
            Some(Self::start_maintenance_task(
                pools.values().cloned().collect(),
                Duration::from_secs(config.reclaim_interval_seconds),
            ))
        };

        Ok(Self {
            pools,
            maintenance_handle,
        })
    }

    /// Check out a client from `service`'s pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownService`] for an unconfigured service,
    /// otherwise the underlying pool's acquisition error.
    pub async fn acquire(&self, service: &str) -> PoolResult<ClientGuard<C>> {
        self.pool(service)?.acquire().await
    }

    /// The pool serving `service`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownService`] for an unconfigured service.
    pub fn pool(&self, service: &str) -> PoolResult<&Arc<ServicePool<C>>> {
        self.pools
            .get(service)
            .ok_or_else(|| PoolError::UnknownService(service.to_string()))
    }

    /// Names of the configured services.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Snapshot of every pool's counters, keyed by service.
    pub fn status(&self) -> HashMap<String, PoolStatus> {
        self.pools
            .iter()
            .map(|(service, pool)| (service.clone(), pool.status()))
            .collect()
    }

    fn start_maintenance_task(
        pools: Vec<Arc<ServicePool<C>>>,
        period: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The immediate first tick would probe pools that are still empty.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                for pool in &pools {
                    pool.maintain().await;
                }
                debug!(pools = pools.len(), "pool maintenance pass completed");
            }
        })
    }
}

impl<C: PooledClient> std::fmt::Debug for ConnectionPoolManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPoolManager")
            .field("services", &self.pools.len())
            .finish_non_exhaustive()
    }
}

impl<C: PooledClient> Drop for ConnectionPoolManager<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.maintenance_handle.take() {
            handle.abort();
        }
    }
}
