//! Redis-backed failure store

use crate::{
    error::{FaultError, FaultResult},
    record::FailureRecord,
    store::FailureStore,
};
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Key prefix for failure records in the shared store.
pub const DEFAULT_KEY_PREFIX: &str = "ballast:failure:";

/// [`FailureStore`] over a shared Redis instance.
///
/// Records are serialized as JSON and expire natively via `SET ... EX`, so a
/// record's dedup window is enforced by the store even when every process
/// that wrote it is gone. Sharing one Redis across processes is what turns
/// per-process dedup into fleet-wide dedup.
#[derive(Clone)]
pub struct RedisFailureStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisFailureStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> FaultResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|err| FaultError::InvalidConfiguration(err.to_string()))?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Replace the key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key_for(&self, dedup_hash: &str) -> String {
        format!("{}{dedup_hash}", self.key_prefix)
    }
}

impl std::fmt::Debug for RedisFailureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisFailureStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FailureStore for RedisFailureStore {
    async fn upsert(&self, record: &FailureRecord) -> FaultResult<()> {
        let payload = serde_json::to_string(record)?;
        // Redis expiry has one-second resolution; never round down to zero.
        let ttl_secs = (record.expires_at - Utc::now()).num_seconds().max(1);
        let ttl_secs = u64::try_from(ttl_secs).unwrap_or(1);

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key_for(&record.dedup_hash), payload, ttl_secs)
            .await?;
        Ok(())
    }

    async fn find_by_hash(&self, dedup_hash: &str) -> FaultResult<Option<FailureRecord>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(self.key_for(dedup_hash)).await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::FailureReport;
    use crate::severity::Severity;
    use ballast_retry::ErrorKind;
    use std::time::Duration;

    // Requires a local Redis at the default port; run with --ignored.
    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_redis_failure_store_round_trip() {
        let store = RedisFailureStore::connect("redis://127.0.0.1:6379")
            .await
            .expect("redis should be reachable")
            .with_key_prefix("ballast:test:failure:");

        let report = FailureReport::new("search-api", "query", ErrorKind::Timeout);
        let record = FailureRecord::new(&report, Severity::High, Duration::from_secs(30));

        store.upsert(&record).await.expect("upsert should succeed");
        let found = store
            .find_by_hash(&record.dedup_hash)
            .await
            .expect("find should succeed");
        assert_eq!(found, Some(record));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build")
            .block_on(RedisFailureStore::connect("not-a-redis-url"));
        assert!(matches!(result, Err(FaultError::InvalidConfiguration(_))));
    }
}
