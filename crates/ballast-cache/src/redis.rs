//! Redis-backed remote store

use crate::{
    error::{CacheError, CacheResult},
    store::RemoteStore,
};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// [`RemoteStore`] over a shared Redis instance.
///
/// Uses a [`ConnectionManager`], which multiplexes one connection and
/// reconnects on failure; cloning it is cheap and every operation works on
/// its own clone. TTLs map to native `SET ... EX` expiry, so the store purges
/// stale values without caller involvement.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|err| CacheError::InvalidConfiguration(err.to_string()))?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        // Redis expiry has one-second resolution; never round down to zero.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Requires a local Redis at the default port; run with --ignored.
    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_redis_store_round_trip() {
        let store = RedisStore::connect("redis://127.0.0.1:6379")
            .await
            .expect("redis should be reachable");

        store.ping().await.expect("ping should succeed");

        store
            .set("ballast:test:round-trip", b"value".to_vec(), Duration::from_secs(30))
            .await
            .expect("set should succeed");

        let fetched = store
            .get("ballast:test:round-trip")
            .await
            .expect("get should succeed");
        assert_eq!(fetched, Some(b"value".to_vec()));

        store
            .delete("ballast:test:round-trip")
            .await
            .expect("delete should succeed");
        let fetched = store
            .get("ballast:test:round-trip")
            .await
            .expect("get should succeed");
        assert_eq!(fetched, None);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build")
            .block_on(RedisStore::connect("not-a-redis-url"));
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }
}
