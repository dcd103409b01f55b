//! Caller-facing resilience facade
//!
//! [`ResilientClient`] composes the cache, the connection pools, the retry
//! executor, and the failure router into a single call path. Request
//! handlers use [`cached_call`](ResilientClient::cached_call) and never see
//! the tier structure behind it: a cache hit short-circuits, a miss runs the
//! downstream operation under the service's retry policy with a pooled
//! client checked out per attempt, and the response is written back to both
//! cache tiers. Terminal failures are reported to the failure router before
//! they are returned.
//!
//! Clients are built through [`ResilientClientBuilder`], which wires
//! in-process defaults (memory remote store, memory failure store, log
//! notifier) that production deployments override with `with_*` calls.

use crate::config::CoreConfig;
use crate::error::{CallError, CoreError, CoreResult, DownstreamError};
use ballast_cache::{HybridCache, HybridStats, MemoryStore, RemoteStore, RequestKey};
use ballast_faults::{
    FailureReport, FailureRouter, FailureStore, LogNotifier, MemoryFailureStore, Notifier,
};
use ballast_pool::{ClientFactory, ClientGuard, ConnectionPoolManager, PoolStatus, PooledClient};
use ballast_retry::RetryExecutor;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Point-in-time counters across the cache and every pool.
#[derive(Debug, Clone)]
pub struct CoreStats {
    /// Cache counters for both tiers plus promotions.
    pub cache: HybridStats,
    /// Pool occupancy keyed by service name.
    pub pools: HashMap<String, PoolStatus>,
}

/// The composed resilience core.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
pub struct ResilientClient<C: PooledClient> {
    cache: HybridCache,
    pools: ConnectionPoolManager<C>,
    retry: RetryExecutor,
    router: FailureRouter,
}

impl<C: PooledClient> ResilientClient<C> {
    /// Start building a client from a configuration and a client factory.
    pub fn builder(
        config: CoreConfig,
        factory: Arc<dyn ClientFactory<Client = C>>,
    ) -> ResilientClientBuilder<C> {
        ResilientClientBuilder::new(config, factory)
    }

    /// Call `service` through the cache.
    ///
    /// The cached response for a `(namespace, principal, payload)` triple is
    /// reused until the namespace TTL expires or it is invalidated. On a
    /// miss, `work` runs under the retry policy configured for `service`,
    /// with a fresh client checked out of the service's pool for each
    /// attempt, and the response is written back to both cache tiers before
    /// it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CallFailed`] when the downstream call failed
    /// fatally or exhausted its attempts, and [`CoreError::Cache`] when
    /// `namespace` is not configured.
    pub async fn cached_call<F, Fut>(
        &self,
        namespace: &str,
        principal: &str,
        payload: &str,
        service: &str,
        operation: &str,
        work: F,
    ) -> CoreResult<Bytes>
    where
        F: Fn(ClientGuard<C>) -> Fut,
        Fut: Future<Output = Result<Bytes, DownstreamError>>,
    {
        let key = RequestKey::build(namespace, principal, payload);
        if let Some(value) = self.cache.get(&key).await? {
            debug!(namespace, principal, service, "request served from cache");
            return Ok(value);
        }

        let value = self.execute_downstream(service, operation, &work).await?;
        self.cache.set(&key, value.clone()).await?;
        Ok(value)
    }

    /// Call `service` without consulting the cache.
    ///
    /// Same pooling and retry behavior as
    /// [`cached_call`](Self::cached_call); meant for operations whose
    /// responses must not be reused.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CallFailed`] when the downstream call failed
    /// fatally or exhausted its attempts.
    pub async fn call<F, Fut>(
        &self,
        service: &str,
        operation: &str,
        work: F,
    ) -> CoreResult<Bytes>
    where
        F: Fn(ClientGuard<C>) -> Fut,
        Fut: Future<Output = Result<Bytes, DownstreamError>>,
    {
        self.execute_downstream(service, operation, &work).await
    }

    /// Run one downstream operation under the service's retry policy and
    /// report the terminal outcome to the failure router if it failed.
    async fn execute_downstream<F, Fut>(
        &self,
        service: &str,
        operation: &str,
        work: &F,
    ) -> CoreResult<Bytes>
    where
        F: Fn(ClientGuard<C>) -> Fut,
        Fut: Future<Output = Result<Bytes, DownstreamError>>,
    {
        // Acquiring inside the attempt keeps pool waits under the retry
        // policy and guarantees a failed attempt's client is returned (or
        // discarded) before the backoff sleep.
        let attempt = || async move {
            let client = self
                .pools
                .acquire(service)
                .await
                .map_err(CallError::from)?;
            work(client).await.map_err(CallError::from)
        };

        match self.retry.execute(service, attempt).await {
            Ok(value) => Ok(value),
            Err(err) => {
                let report = FailureReport::new(service, operation, err.kind())
                    .with_context("attempts", err.attempts().to_string())
                    .with_context("total_delay_ms", err.total_delay_ms().to_string());
                self.router.route(report);
                Err(CoreError::call_failed(service, err))
            }
        }
    }

    /// Remove one cached response from both tiers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] when `namespace` is not configured.
    pub async fn invalidate(
        &self,
        namespace: &str,
        principal: &str,
        payload: &str,
    ) -> CoreResult<()> {
        let key = RequestKey::build(namespace, principal, payload);
        self.cache.invalidate(&key).await?;
        Ok(())
    }

    /// Drop every in-process cached response a principal has in a namespace.
    ///
    /// Remote copies are not touched and age out via their TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] when `namespace` is not configured.
    pub fn invalidate_principal(&self, namespace: &str, principal: &str) -> CoreResult<usize> {
        Ok(self.cache.invalidate_principal(namespace, principal)?)
    }

    /// Round-trip the remote cache store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] when the store is unreachable.
    pub async fn ping_remote(&self) -> CoreResult<()> {
        self.cache.ping_remote().await?;
        Ok(())
    }

    /// Snapshot cache and pool counters.
    pub fn stats(&self) -> CoreStats {
        CoreStats {
            cache: self.cache.stats(),
            pools: self.pools.status(),
        }
    }

    /// Drain the failure queue and wait for queued reports to be processed.
    ///
    /// Cache sweep and pool reclaim tasks keep running until the client is
    /// dropped; their work is periodic and loses nothing on abort.
    pub async fn shutdown(&self) {
        self.router.close().await;
    }
}

impl<C: PooledClient> fmt::Debug for ResilientClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("pools", &self.pools.status().len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResilientClient`].
///
/// Defaults to an in-process remote store, an in-process failure store, and
/// the log notifier, so tests and single-node deployments work without any
/// external infrastructure.
pub struct ResilientClientBuilder<C: PooledClient> {
    config: CoreConfig,
    factory: Arc<dyn ClientFactory<Client = C>>,
    remote_store: Arc<dyn RemoteStore>,
    failure_store: Arc<dyn FailureStore>,
    notifier: Arc<dyn Notifier>,
}

impl<C: PooledClient> ResilientClientBuilder<C> {
    /// Create a builder with in-process defaults.
    pub fn new(config: CoreConfig, factory: Arc<dyn ClientFactory<Client = C>>) -> Self {
        Self {
            config,
            factory,
            remote_store: Arc::new(MemoryStore::new()),
            failure_store: Arc::new(MemoryFailureStore::new()),
            notifier: Arc::new(LogNotifier::new()),
        }
    }

    /// Use a different remote cache store.
    #[must_use]
    pub fn with_remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = store;
        self
    }

    /// Use a different failure record store.
    #[must_use]
    pub fn with_failure_store(mut self, store: Arc<dyn FailureStore>) -> Self {
        self.failure_store = store;
        self
    }

    /// Use a different notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Validate the configuration and construct the client.
    ///
    /// Must be called within a Tokio runtime; the failure router worker and
    /// any configured sweep and reclaim tasks are spawned here.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfiguration`] when any configuration
    /// section fails validation.
    pub fn build(self) -> CoreResult<ResilientClient<C>> {
        self.config
            .validate()
            .map_err(CoreError::InvalidConfiguration)?;

        let cache = HybridCache::new(self.config.cache, self.remote_store)?;
        let pools = ConnectionPoolManager::new(self.config.pools, self.factory)?;
        let retry = RetryExecutor::new(self.config.retries)?;
        let router = FailureRouter::new(self.config.faults, self.failure_store, self.notifier)?;

        Ok(ResilientClient {
            cache,
            pools,
            retry,
            router,
        })
    }
}

impl<C: PooledClient> fmt::Debug for ResilientClientBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClientBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
