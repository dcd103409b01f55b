//! Pool configuration
//!
//! One [`PoolConfig`] per downstream service, collected into a
//! [`PoolManagerConfig`]. Configuration is immutable after startup; the pools
//! themselves hold the mutable state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upper bound on concurrently checked-out clients per service
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Default number of idle clients kept warm per service
pub const DEFAULT_MAX_IDLE: usize = 4;

/// Default deadline for acquiring a pooled client
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;

/// Default deadline for a single request on a pooled client
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

/// Default interval for idle reclamation and health probing (0 disables)
pub const DEFAULT_RECLAIM_INTERVAL_SECONDS: u64 = 30;

/// Pool policy for one downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Downstream service name, e.g. `"search-api"`
    pub service: String,
    /// Upper bound on concurrently checked-out clients
    pub max_connections: usize,
    /// Idle clients kept warm; excess is reclaimed under low demand
    pub max_idle: usize,
    /// Acquisition deadline in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-request deadline in milliseconds
    pub read_timeout_ms: u64,
}

impl PoolConfig {
    /// Create a pool policy for `service` with default sizing.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_idle: DEFAULT_MAX_IDLE,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Set the concurrent checkout bound.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the warm idle target.
    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Set the acquisition deadline in milliseconds.
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-request deadline in milliseconds.
    #[must_use]
    pub fn with_read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// Acquisition deadline as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Per-request deadline as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.service.is_empty() {
            return Err("service name must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err(format!(
                "service '{}': max_connections must be greater than zero",
                self.service
            ));
        }
        if self.max_idle > self.max_connections {
            return Err(format!(
                "service '{}': max_idle ({}) must not exceed max_connections ({})",
                self.service, self.max_idle, self.max_connections
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(format!(
                "service '{}': connect_timeout_ms must be greater than zero",
                self.service
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(format!(
                "service '{}': read_timeout_ms must be greater than zero",
                self.service
            ));
        }
        Ok(())
    }
}

/// Configuration for the pool manager as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolManagerConfig {
    /// One pool policy per downstream service
    pub pools: Vec<PoolConfig>,
    /// Idle reclamation and health probe interval in seconds; 0 disables
    pub reclaim_interval_seconds: u64,
}

impl PoolManagerConfig {
    /// Create an empty manager configuration with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service pool policy.
    #[must_use]
    pub fn add_pool(mut self, pool: PoolConfig) -> Self {
        self.pools.push(pool);
        self
    }

    /// Set the maintenance interval in seconds (0 disables).
    #[must_use]
    pub fn with_reclaim_interval_seconds(mut self, seconds: u64) -> Self {
        self.reclaim_interval_seconds = seconds;
        self
    }

    /// Look up a service's pool policy by name.
    pub fn pool(&self, service: &str) -> Option<&PoolConfig> {
        self.pools.iter().find(|pool| pool.service == service)
    }

    /// Validate the configuration, including every pool policy.
    pub fn validate(&self) -> Result<(), String> {
        for pool in &self.pools {
            pool.validate()?;
        }
        for (i, pool) in self.pools.iter().enumerate() {
            if self.pools[..i]
                .iter()
                .any(|other| other.service == pool.service)
            {
                return Err(format!("duplicate pool for service '{}'", pool.service));
            }
        }
        Ok(())
    }
}

impl Default for PoolManagerConfig {
    fn default() -> Self {
        Self {
            pools: Vec::new(),
            reclaim_interval_seconds: DEFAULT_RECLAIM_INTERVAL_SECONDS,
        }
    }
}
