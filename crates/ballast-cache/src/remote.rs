//! Remote cache tier
//!
//! Wraps a [`RemoteStore`] with the policies the distributed tier needs:
//! values at or above the compression threshold are deflated before storage,
//! every round trip runs under a deadline, and store failures degrade to
//! cache misses instead of surfacing to the caller. The cache is an
//! optimization, never a dependency for correctness.
//!
//! Stored values are self-describing: a one-byte mode prefix records whether
//! the remainder is raw or zlib-compressed, so reads decode correctly even
//! when namespace compression settings drift between deployments.

use crate::{
    config::HybridCacheConfig,
    error::{CacheError, CacheResult},
    stats::{RemoteMetrics, RemoteStats},
    store::RemoteStore,
};
use bytes::Bytes;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, warn};

/// Stored value is raw bytes.
const MODE_RAW: u8 = b'R';
/// Stored value is zlib-compressed.
const MODE_ZLIB: u8 = b'Z';

/// Distributed cache tier with best-effort failure semantics.
pub struct RemoteCache {
    store: Arc<dyn RemoteStore>,
    compression_threshold: usize,
    timeout_ms: u64,
    op_timeout: Duration,
    metrics: RemoteMetrics,
}

impl RemoteCache {
    /// Create the tier over `store`, tuned by `config`.
    pub fn new(store: Arc<dyn RemoteStore>, config: &HybridCacheConfig) -> Self {
        Self {
            store,
            compression_threshold: config.compression_threshold,
            timeout_ms: config.remote_timeout_ms,
            op_timeout: Duration::from_millis(config.remote_timeout_ms),
            metrics: RemoteMetrics::default(),
        }
    }

    /// Look up a key. Store failures and timeouts degrade to `None`.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                self.metrics.record_hit();
                Some(value)
            }
            Ok(None) => {
                self.metrics.record_miss();
                None
            }
            Err(err) => {
                self.metrics.record_error();
                if err.is_degradable() {
                    warn!(key, error = %err, "remote cache read failed, treating as miss");
                } else {
                    error!(key, error = %err, "unexpected remote cache failure, treating as miss");
                }
                None
            }
        }
    }

    /// Store a value with the given TTL. Failures are logged and swallowed.
    pub async fn put(&self, key: &str, value: &[u8], ttl: Duration, compress: bool) {
        if let Err(err) = self.try_put(key, value, ttl, compress).await {
            self.metrics.record_put_failure();
            warn!(key, error = %err, "remote cache write failed, continuing without it");
        }
    }

    /// Remove a key. Failures are logged and swallowed; the value then ages
    /// out through its native TTL.
    pub async fn invalidate(&self, key: &str) {
        let outcome = self.bounded(self.store.delete(key)).await;
        if let Err(err) = outcome {
            self.metrics.record_put_failure();
            warn!(key, error = %err, "remote cache invalidation failed");
        }
    }

    /// Probe the backing store.
    pub async fn ping(&self) -> CacheResult<()> {
        self.bounded(self.store.ping()).await
    }

    /// Snapshot of this tier's counters.
    pub fn stats(&self) -> RemoteStats {
        self.metrics.snapshot()
    }

    async fn try_get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        match self.bounded(self.store.get(key)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn try_put(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
        compress: bool,
    ) -> CacheResult<()> {
        let encoded = encode(value, compress, self.compression_threshold)?;
        self.bounded(self.store.set(key, encoded, ttl)).await
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        timeout(self.op_timeout, operation)
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_ms: self.timeout_ms,
            })?
    }
}

impl std::fmt::Debug for RemoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCache")
            .field("compression_threshold", &self.compression_threshold)
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

fn encode(value: &[u8], compress: bool, threshold: usize) -> CacheResult<Vec<u8>> {
    if compress && value.len() >= threshold {
        let mut out = Vec::with_capacity(value.len() / 2 + 1);
        out.push(MODE_ZLIB);
        let mut encoder = ZlibEncoder::new(out, Compression::default());
        encoder
            .write_all(value)
            .map_err(|err| CacheError::Compression(err.to_string()))?;
        encoder
            .finish()
            .map_err(|err| CacheError::Compression(err.to_string()))
    } else {
        let mut out = Vec::with_capacity(value.len() + 1);
        out.push(MODE_RAW);
        out.extend_from_slice(value);
        Ok(out)
    }
}

fn decode(raw: &[u8]) -> CacheResult<Bytes> {
    match raw.split_first() {
        Some((&MODE_RAW, rest)) => Ok(Bytes::copy_from_slice(rest)),
        Some((&MODE_ZLIB, rest)) => {
            let mut decoder = ZlibDecoder::new(rest);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|err| CacheError::Corrupt(err.to_string()))?;
            Ok(Bytes::from(out))
        }
        Some((mode, _)) => Err(CacheError::Corrupt(format!(
            "unknown value mode {mode:#04x}"
        ))),
        None => Err(CacheError::Corrupt("empty stored value".to_string())),
    }
}
