//! Aggregate configuration
//!
//! [`CoreConfig`] bundles the cache, pool, retry, and fault-routing
//! configuration into one serde-friendly value that can be loaded from JSON
//! at deployment time. Everything here is immutable after
//! [`build`](crate::ResilientClientBuilder::build).

use crate::error::{CoreError, CoreResult};
use ballast_cache::HybridCacheConfig;
use ballast_faults::FaultRouterConfig;
use ballast_pool::PoolManagerConfig;
use ballast_retry::PolicySet;
use serde::{Deserialize, Serialize};

/// Configuration for the whole resilience core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    /// Two-tier cache configuration
    #[serde(default)]
    pub cache: HybridCacheConfig,
    /// Per-service pool configuration
    #[serde(default)]
    pub pools: PoolManagerConfig,
    /// Per-service retry policies
    #[serde(default)]
    pub retries: PolicySet,
    /// Failure routing configuration
    #[serde(default)]
    pub faults: FaultRouterConfig,
}

impl CoreConfig {
    /// Create a configuration with every section at its defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache section.
    #[must_use]
    pub fn with_cache(mut self, cache: HybridCacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the pool section.
    #[must_use]
    pub fn with_pools(mut self, pools: PoolManagerConfig) -> Self {
        self.pools = pools;
        self
    }

    /// Replace the retry section.
    #[must_use]
    pub fn with_retries(mut self, retries: PolicySet) -> Self {
        self.retries = retries;
        self
    }

    /// Replace the fault routing section.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultRouterConfig) -> Self {
        self.faults = faults;
        self
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfiguration`] when the document does not
    /// parse or any section fails validation.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| CoreError::InvalidConfiguration(err.to_string()))?;
        config.validate().map_err(CoreError::InvalidConfiguration)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        self.pools.validate()?;
        self.retries.validate()?;
        self.faults.validate()?;
        Ok(())
    }
}
