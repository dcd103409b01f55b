//! Per-service connection pooling
//!
//! This crate provides the pooling layer of the ballast resilience stack:
//! one bounded, adaptively-sized pool of reusable clients per downstream
//! service, behind a single manager.
//!
//! # Features
//!
//! - **Per-service isolation**: each service gets its own pool, so
//!   saturation or failure of one downstream never starves another
//! - **Adaptive sizing**: pools grow on demand up to `max_connections` and
//!   shrink back to `max_idle` when demand drops
//! - **Scoped checkouts**: [`acquire`](ConnectionPoolManager::acquire)
//!   returns an RAII guard that returns the client on every exit path
//! - **Health probing**: idle clients are periodically probed and replaced
//!   when they go bad; checked-out clients are never probed
//! - **Bounded waiting**: a saturated pool fails acquisition with a
//!   retryable [`PoolError::Exhausted`] after `connect_timeout_ms`
//!
//! # Example
//!
//! ```no_run
//! use ballast_pool::{ConnectionPoolManager, HttpConnector, PoolConfig, PoolManagerConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ballast_pool::PoolError> {
//! let config = PoolManagerConfig::new()
//!     .add_pool(PoolConfig::new("search-api").with_max_connections(8));
//! let connector = HttpConnector::new().with_endpoint("search-api", "https://search.internal");
//! let manager = ConnectionPoolManager::new(config, Arc::new(connector))?;
//!
//! let mut client = manager.acquire("search-api").await?;
//! if client.get("/v1/query?q=reset+wifi").await.is_err() {
//!     client.mark_unhealthy();
//! }
//! drop(client);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod pool;

pub use client::{ClientFactory, PooledClient};
pub use config::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_IDLE,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_RECLAIM_INTERVAL_SECONDS, PoolConfig, PoolManagerConfig,
};
pub use error::{PoolError, PoolResult};
pub use http::{HttpClient, HttpConnector};
pub use manager::ConnectionPoolManager;
pub use pool::{ClientGuard, PoolStatus, ServicePool};
