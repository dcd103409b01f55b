//! Cache configuration
//!
//! Configuration is immutable for the process lifetime: built once at
//! startup, validated, then passed by reference into the cache constructors.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default entry lifetime for a namespace
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default in-process capacity for a namespace
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Default background sweep interval (0 disables the sweep)
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Values at or above this size are compressed in the remote tier
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 4 * 1024;

/// Deadline for a single remote store round trip
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 250;

/// Policy for one data category (namespace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNamespaceConfig {
    /// Namespace name, e.g. `"retrieval-result"`
    pub namespace: String,
    /// Entry lifetime in seconds, applied in both tiers
    pub ttl_seconds: u64,
    /// In-process capacity; the strict bound for LRU eviction
    pub max_entries: usize,
    /// Whether large values are compressed in the remote tier
    pub compress: bool,
}

impl CacheNamespaceConfig {
    /// Create a namespace policy with default TTL and capacity.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_entries: DEFAULT_MAX_ENTRIES,
            compress: false,
        }
    }

    /// Set the entry lifetime in seconds.
    #[must_use]
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Set the in-process capacity.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Enable or disable remote-tier compression.
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Entry lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("namespace must not be empty".to_string());
        }
        if self.namespace.contains(':') {
            return Err(format!(
                "namespace '{}' must not contain ':' (reserved as the key separator)",
                self.namespace
            ));
        }
        if self.ttl_seconds == 0 {
            return Err(format!(
                "namespace '{}': ttl_seconds must be greater than zero",
                self.namespace
            ));
        }
        if self.max_entries == 0 {
            return Err(format!(
                "namespace '{}': max_entries must be greater than zero",
                self.namespace
            ));
        }
        Ok(())
    }
}

/// Configuration for the two-tier cache as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridCacheConfig {
    /// Per-category policies; one in-process tier is created per entry
    pub namespaces: Vec<CacheNamespaceConfig>,
    /// Background sweep interval in seconds; 0 disables the sweep
    pub sweep_interval_seconds: u64,
    /// Size at or above which remote values are compressed
    pub compression_threshold: usize,
    /// Deadline for a single remote round trip in milliseconds
    pub remote_timeout_ms: u64,
}

impl HybridCacheConfig {
    /// Create an empty configuration with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace policy.
    #[must_use]
    pub fn add_namespace(mut self, namespace: CacheNamespaceConfig) -> Self {
        self.namespaces.push(namespace);
        self
    }

    /// Set the background sweep interval in seconds (0 disables).
    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    /// Set the remote compression threshold in bytes.
    #[must_use]
    pub fn with_compression_threshold(mut self, threshold: usize) -> Self {
        self.compression_threshold = threshold;
        self
    }

    /// Set the remote round-trip deadline in milliseconds.
    #[must_use]
    pub fn with_remote_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.remote_timeout_ms = timeout_ms;
        self
    }

    /// Look up a namespace policy by name.
    pub fn namespace(&self, name: &str) -> Option<&CacheNamespaceConfig> {
        self.namespaces.iter().find(|ns| ns.namespace == name)
    }

    /// Validate the configuration, including every namespace policy.
    pub fn validate(&self) -> Result<(), String> {
        if self.remote_timeout_ms == 0 {
            return Err("remote_timeout_ms must be greater than zero".to_string());
        }
        for ns in &self.namespaces {
            ns.validate()?;
        }
        for (i, ns) in self.namespaces.iter().enumerate() {
            if self.namespaces[..i]
                .iter()
                .any(|other| other.namespace == ns.namespace)
            {
                return Err(format!("duplicate namespace '{}'", ns.namespace));
            }
        }
        Ok(())
    }
}

impl Default for HybridCacheConfig {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}
