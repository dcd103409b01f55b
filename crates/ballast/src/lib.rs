//! Resilience and performance core
//!
//! This crate ties the ballast stack together: request-scoped caching
//! (`ballast-cache`), per-service connection pooling (`ballast-pool`),
//! classified retries with backoff (`ballast-retry`), and terminal-failure
//! routing (`ballast-faults`), behind one [`ResilientClient`] that request
//! handlers call without knowing the structure underneath.
//!
//! # Features
//!
//! - **One call path**: [`ResilientClient::cached_call`] checks the cache,
//!   dials the downstream under the service's retry policy on a miss, and
//!   writes the response back to both tiers
//! - **Per-attempt pooling**: every retry attempt checks a fresh client out
//!   of the service's pool, so an attempt never reuses the connection that
//!   just failed
//! - **Failure routing**: fatal and exhausted calls are reported to the
//!   failure router before the error reaches the caller
//! - **Deployment wiring**: [`CoreConfig`] loads from JSON and validates
//!   every section; [`ResilientClientBuilder`] defaults to in-process
//!   stores so tests need no infrastructure
//!
//! # Example
//!
//! ```no_run
//! use ballast::{
//!     CacheNamespaceConfig, CoreConfig, DownstreamError, HttpConnector, HybridCacheConfig,
//!     PoolConfig, PoolManagerConfig, PolicySet, ResilientClient, RetryPolicy, Strategy,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ballast::CoreError> {
//! let config = CoreConfig::new()
//!     .with_cache(HybridCacheConfig::new().add_namespace(
//!         CacheNamespaceConfig::new("retrieval-result").with_ttl_seconds(1_800),
//!     ))
//!     .with_pools(PoolManagerConfig::new().add_pool(
//!         PoolConfig::new("search-api").with_max_connections(8),
//!     ))
//!     .with_retries(PolicySet::new().add_policy(
//!         RetryPolicy::new("search-api").with_strategy(Strategy::ExponentialJittered),
//!     ));
//!
//! let connector = HttpConnector::new().with_endpoint("search-api", "https://search.internal");
//! let client = ResilientClient::builder(config, Arc::new(connector)).build()?;
//!
//! let answer = client
//!     .cached_call("retrieval-result", "u1", "reset wifi", "search-api", "query", |http| {
//!         async move {
//!             let response = http.get("/v1/query?q=reset+wifi").await?;
//!             if !response.status().is_success() {
//!                 return Err(DownstreamError::from_status(response.status(), "query rejected"));
//!             }
//!             Ok(response.bytes().await?)
//!         }
//!     })
//!     .await?;
//! # let _ = answer;
//! # client.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{CoreStats, ResilientClient, ResilientClientBuilder};
pub use config::CoreConfig;
pub use error::{CallError, CoreError, CoreResult, DownstreamError};

pub use ballast_cache::{
    CacheNamespaceConfig, CacheStats, HybridCacheConfig, HybridStats, MemoryStore, RedisStore,
    RemoteStats, RemoteStore, RequestKey,
};
pub use ballast_faults::{
    FailureRecord, FailureReport, FailureStore, FaultRouterConfig, LogNotifier,
    MemoryFailureStore, Notifier, RedisFailureStore, Severity, SeverityMap,
};
pub use ballast_pool::{
    ClientFactory, ClientGuard, ConnectionPoolManager, HttpClient, HttpConnector, PoolConfig,
    PoolManagerConfig, PoolStatus, PooledClient,
};
pub use ballast_retry::{Classify, ErrorKind, PolicySet, RetryPolicy, Strategy};
