//! Pool client traits
//!
//! A pool manages values of any type implementing [`PooledClient`]; new
//! clients are produced on demand by a [`ClientFactory`]. The factory
//! receives the service's [`PoolConfig`] so one factory can serve every
//! configured service.

use crate::config::PoolConfig;
use crate::error::PoolResult;
use async_trait::async_trait;

/// A client that can live in a pool.
///
/// `is_healthy` is a lightweight no-op probe. It is only ever called on idle
/// clients; a client checked out by a caller is never probed concurrently.
#[async_trait]
pub trait PooledClient: Send + Sync + 'static {
    /// Probe whether this client is still usable.
    async fn is_healthy(&self) -> bool;
}

/// Builds clients for the pools.
#[async_trait]
pub trait ClientFactory: Send + Sync + 'static {
    /// Client type this factory produces.
    type Client: PooledClient;

    /// Build a fresh client for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Connect`](crate::PoolError::Connect) when the
    /// client cannot be constructed or the service is unreachable.
    async fn connect(&self, config: &PoolConfig) -> PoolResult<Self::Client>;
}
