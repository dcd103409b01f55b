//! Single-service client pool
//!
//! A [`ServicePool`] bounds concurrent checkouts with a semaphore sized to
//! `max_connections` and keeps released clients on an idle stack for reuse.
//! The pool grows on demand: a checkout with no idle client builds a fresh
//! one through the [`ClientFactory`], and [`ServicePool::maintain`] later
//! shrinks the idle set back to `max_idle` and discards clients that fail
//! their health probe.
//!
//! Checkouts are RAII: [`acquire`](ServicePool::acquire) returns a
//! [`ClientGuard`] whose drop returns the client to the pool (or discards it
//! when flagged unhealthy) and releases the checkout slot on every exit path.

use crate::client::{ClientFactory, PooledClient};
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Snapshot of one pool's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStatus {
    /// Service this pool serves
    pub service: String,
    /// Live clients (idle plus checked out)
    pub total: usize,
    /// Clients resting on the idle stack
    pub idle: usize,
    /// Clients currently checked out
    pub in_flight: usize,
    /// Callers currently waiting for a checkout slot
    pub waiting: usize,
    /// Clients built since the pool started
    pub created: u64,
    /// Clients dropped as unhealthy or reclaimed as excess idle
    pub discarded: u64,
}

/// State shared between a pool and its outstanding guards.
struct PoolShared<C> {
    service: String,
    idle: Mutex<Vec<C>>,
    in_flight: AtomicUsize,
    waiting: AtomicUsize,
    created: AtomicU64,
    discarded: AtomicU64,
}

/// Bounded pool of reusable clients for one downstream service.
pub struct ServicePool<C: PooledClient> {
    config: PoolConfig,
    factory: Arc<dyn ClientFactory<Client = C>>,
    permits: Arc<Semaphore>,
    shared: Arc<PoolShared<C>>,
}

impl<C: PooledClient> ServicePool<C> {
    /// Create a pool for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(
        config: PoolConfig,
        factory: Arc<dyn ClientFactory<Client = C>>,
    ) -> PoolResult<Self> {
        config
            .validate()
            .map_err(PoolError::InvalidConfiguration)?;

        Ok(Self {
            permits: Arc::new(Semaphore::new(config.max_connections)),
            shared: Arc::new(PoolShared {
                service: config.service.clone(),
                idle: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
                created: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
            config,
            factory,
        })
    }

    /// Check out a client, waiting up to `connect_timeout_ms` for a slot.
    ///
    /// Reuses an idle client when one is available, otherwise builds a fresh
    /// one. Checkout order among concurrent waiters is not FIFO.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when no slot frees up within the
    /// deadline, or [`PoolError::Connect`] when building a new client fails.
    pub async fn acquire(&self) -> PoolResult<ClientGuard<C>> {
        self.shared.waiting.fetch_add(1, Ordering::Relaxed);
        let acquired = timeout(
            self.config.connect_timeout(),
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await;
        self.shared.waiting.fetch_sub(1, Ordering::Relaxed);

        // The semaphore is never closed, so the inner result only fails if
        // the deadline elapsed first.
        let Ok(Ok(permit)) = acquired else {
            return Err(PoolError::exhausted(
                &self.shared.service,
                self.config.connect_timeout_ms,
            ));
        };

        let reused = self.shared.idle.lock().pop();
        let client = match reused {
            Some(client) => client,
            None => {
                // Grow under load; the permit already bounds total checkouts.
                let client = self.factory.connect(&self.config).await?;
                self.shared.created.fetch_add(1, Ordering::Relaxed);
                debug!(service = %self.shared.service, "built new pooled client");
                client
            }
        };

        self.shared.in_flight.fetch_add(1, Ordering::Relaxed);
        Ok(ClientGuard {
            client: Some(client),
            discard: false,
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }

    /// Probe idle clients and shrink the idle set to `max_idle`.
    ///
    /// Clients that fail their probe are discarded; of the healthy ones, the
    /// most recently used stay warm. Checked-out clients are never probed.
    /// Probing happens outside the pool lock, so a client under probe is
    /// simply unavailable for reuse until it passes.
    pub async fn maintain(&self) {
        let candidates: Vec<C> = {
            let mut idle = self.shared.idle.lock();
            idle.drain(..).collect()
        };
        if candidates.is_empty() {
            return;
        }

        let mut healthy = Vec::with_capacity(candidates.len());
        for client in candidates {
            if client.is_healthy().await {
                healthy.push(client);
            } else {
                self.shared.discarded.fetch_add(1, Ordering::Relaxed);
                warn!(
                    service = %self.shared.service,
                    "discarding idle client that failed its health probe"
                );
            }
        }

        if healthy.len() > self.config.max_idle {
            let excess = healthy.len() - self.config.max_idle;
            // The stack grows at the back, so the front holds the coldest.
            healthy.drain(..excess);
            self.shared.discarded.fetch_add(excess as u64, Ordering::Relaxed);
            debug!(
                service = %self.shared.service,
                excess, "reclaimed idle clients beyond the warm target"
            );
        }

        self.shared.idle.lock().extend(healthy);
    }

    /// Service this pool serves.
    pub fn service(&self) -> &str {
        &self.shared.service
    }

    /// The pool's immutable configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Snapshot of this pool's counters.
    pub fn status(&self) -> PoolStatus {
        let idle = self.shared.idle.lock().len();
        let in_flight = self.shared.in_flight.load(Ordering::Relaxed);
        PoolStatus {
            service: self.shared.service.clone(),
            total: idle + in_flight,
            idle,
            in_flight,
            waiting: self.shared.waiting.load(Ordering::Relaxed),
            created: self.shared.created.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
        }
    }
}

impl<C: PooledClient> std::fmt::Debug for ServicePool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePool")
            .field("service", &self.shared.service)
            .field("max_connections", &self.config.max_connections)
            .finish_non_exhaustive()
    }
}

/// Scoped checkout of a pooled client.
///
/// Dereferences to the client. Dropping the guard returns the client to the
/// pool and frees the checkout slot; call [`mark_unhealthy`] first to discard
/// the client instead of returning it.
///
/// [`mark_unhealthy`]: ClientGuard::mark_unhealthy
#[must_use = "the client returns to the pool as soon as the guard is dropped"]
pub struct ClientGuard<C: PooledClient> {
    client: Option<C>,
    discard: bool,
    shared: Arc<PoolShared<C>>,
    _permit: OwnedSemaphorePermit,
}

impl<C: PooledClient> ClientGuard<C> {
    /// Flag the client so the drop discards it instead of pooling it.
    pub fn mark_unhealthy(&mut self) {
        self.discard = true;
    }
}

impl<C: PooledClient> std::fmt::Debug for ClientGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientGuard")
            .field("service", &self.shared.service)
            .field("discard", &self.discard)
            .finish_non_exhaustive()
    }
}

// The option is only emptied in drop, so deref can rely on it being present.
#[allow(clippy::expect_used)]
impl<C: PooledClient> Deref for ClientGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client.as_ref().expect("client present until drop")
    }
}

#[allow(clippy::expect_used)]
impl<C: PooledClient> DerefMut for ClientGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client.as_mut().expect("client present until drop")
    }
}

impl<C: PooledClient> Drop for ClientGuard<C> {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::Relaxed);
        if let Some(client) = self.client.take() {
            if self.discard {
                self.shared.discarded.fetch_add(1, Ordering::Relaxed);
                warn!(
                    service = %self.shared.service,
                    "discarding client flagged unhealthy by its caller"
                );
            } else {
                self.shared.idle.lock().push(client);
            }
        }
        // The permit field drops after this body, freeing the checkout slot.
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::atomic::AtomicBool;

    struct TestClient {
        id: usize,
        healthy: Arc<AtomicBool>,
    }

    #[async_trait]
    impl PooledClient for TestClient {
        async fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::Relaxed)
        }
    }

    #[derive(Default)]
    struct TestFactory {
        connects: AtomicUsize,
        fail: AtomicBool,
        // Health flags of every client built, in creation order.
        flags: Mutex<Vec<Arc<AtomicBool>>>,
    }

    #[async_trait]
    impl ClientFactory for TestFactory {
        type Client = TestClient;

        async fn connect(&self, config: &PoolConfig) -> PoolResult<TestClient> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(PoolError::connect(&config.service, "connection refused"));
            }
            let id = self.connects.fetch_add(1, Ordering::Relaxed);
            let healthy = Arc::new(AtomicBool::new(true));
            self.flags.lock().push(Arc::clone(&healthy));
            Ok(TestClient { id, healthy })
        }
    }

    mock! {
        ProbeClient {}

        #[async_trait]
        impl PooledClient for ProbeClient {
            async fn is_healthy(&self) -> bool;
        }
    }

    // Hands out pre-built mock clients in order.
    struct MockQueueFactory {
        clients: Mutex<Vec<MockProbeClient>>,
    }

    #[async_trait]
    impl ClientFactory for MockQueueFactory {
        type Client = MockProbeClient;

        async fn connect(&self, config: &PoolConfig) -> PoolResult<MockProbeClient> {
            self.clients
                .lock()
                .pop()
                .ok_or_else(|| PoolError::connect(&config.service, "no more scripted clients"))
        }
    }

    fn pool_with(config: PoolConfig) -> (ServicePool<TestClient>, Arc<TestFactory>) {
        let factory = Arc::new(TestFactory::default());
        let pool = ServicePool::new(config, Arc::clone(&factory) as Arc<dyn ClientFactory<Client = TestClient>>)
            .expect("config should be valid");
        (pool, factory)
    }

    #[tokio::test]
    async fn test_released_client_is_reused() {
        let (pool, factory) = pool_with(PoolConfig::new("search-api"));

        let first = pool.acquire().await.expect("acquire should succeed");
        let first_id = first.id;
        drop(first);

        let second = pool.acquire().await.expect("acquire should succeed");
        assert_eq!(second.id, first_id);
        assert_eq!(factory.connects.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_up_to_capacity() {
        let (pool, factory) = pool_with(PoolConfig::new("search-api").with_max_connections(3));

        let guards =
            futures::future::join_all([pool.acquire(), pool.acquire(), pool.acquire()]).await;
        let guards: Vec<_> = guards
            .into_iter()
            .map(|guard| guard.expect("acquire should succeed"))
            .collect();

        let status = pool.status();
        assert_eq!(status.in_flight, 3);
        assert_eq!(status.total, 3);
        assert_eq!(factory.connects.load(Ordering::Relaxed), 3);

        drop(guards);
        let status = pool.status();
        assert_eq!(status.in_flight, 0);
        assert_eq!(status.idle, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_pool_times_out() {
        let (pool, _factory) = pool_with(
            PoolConfig::new("search-api")
                .with_max_connections(1)
                .with_connect_timeout_ms(100),
        );

        let _held = pool.acquire().await.expect("acquire should succeed");
        let err = pool
            .acquire()
            .await
            .expect_err("saturated pool should time out");
        assert!(matches!(
            err,
            PoolError::Exhausted { service, timeout_ms }
                if service == "search-api" && timeout_ms == 100
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_unblocks_waiter() {
        let (pool, _factory) = pool_with(
            PoolConfig::new("search-api")
                .with_max_connections(1)
                .with_connect_timeout_ms(5_000),
        );
        let pool = Arc::new(pool);

        let held = pool.acquire().await.expect("acquire should succeed");

        let waiter = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            let guard = waiter.acquire().await;
            guard.is_ok()
        });

        // Let the waiter reach the semaphore before releasing.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        drop(held);

        assert!(handle.await.expect("waiter should not panic"));
    }

    #[tokio::test]
    async fn test_marked_unhealthy_client_is_discarded() {
        let (pool, factory) = pool_with(PoolConfig::new("search-api"));

        let mut guard = pool.acquire().await.expect("acquire should succeed");
        guard.mark_unhealthy();
        drop(guard);

        let status = pool.status();
        assert_eq!(status.idle, 0);
        assert_eq!(status.discarded, 1);

        // The replacement is a fresh client.
        let replacement = pool.acquire().await.expect("acquire should succeed");
        assert_eq!(replacement.id, 1);
        assert_eq!(factory.connects.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_frees_the_slot() {
        let (pool, factory) = pool_with(
            PoolConfig::new("search-api")
                .with_max_connections(1)
                .with_connect_timeout_ms(100),
        );

        factory.fail.store(true, Ordering::Relaxed);
        let err = pool.acquire().await.expect_err("connect should fail");
        assert!(matches!(err, PoolError::Connect { .. }));

        // The failed attempt must not leak its checkout slot.
        factory.fail.store(false, Ordering::Relaxed);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_maintain_discards_unhealthy_and_trims_idle() {
        let (pool, factory) = pool_with(
            PoolConfig::new("search-api")
                .with_max_connections(8)
                .with_max_idle(2),
        );

        let guards: Vec<_> = {
            let mut guards = Vec::new();
            for _ in 0..5 {
                guards.push(pool.acquire().await.expect("acquire should succeed"));
            }
            guards
        };
        drop(guards);
        assert_eq!(pool.status().idle, 5);

        // Two of the five go bad while idle.
        {
            let flags = factory.flags.lock();
            flags[0].store(false, Ordering::Relaxed);
            flags[1].store(false, Ordering::Relaxed);
        }

        pool.maintain().await;

        let status = pool.status();
        assert_eq!(status.idle, 2);
        assert_eq!(status.discarded, 3);
    }

    #[tokio::test]
    async fn test_maintain_probes_with_scripted_clients() {
        let mut failing = MockProbeClient::new();
        failing.expect_is_healthy().once().returning(|| false);
        let mut passing = MockProbeClient::new();
        passing.expect_is_healthy().once().returning(|| true);

        let factory = Arc::new(MockQueueFactory {
            clients: Mutex::new(vec![failing, passing]),
        });
        let pool = ServicePool::new(
            PoolConfig::new("transcribe").with_max_idle(4),
            factory as Arc<dyn ClientFactory<Client = MockProbeClient>>,
        )
        .expect("config should be valid");

        let g1 = pool.acquire().await.expect("acquire should succeed");
        let g2 = pool.acquire().await.expect("acquire should succeed");
        drop((g1, g2));

        pool.maintain().await;

        let status = pool.status();
        assert_eq!(status.idle, 1);
        assert_eq!(status.discarded, 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_configuration() {
        let factory = Arc::new(TestFactory::default());
        let result = ServicePool::new(
            PoolConfig::new("s").with_max_connections(0),
            factory as Arc<dyn ClientFactory<Client = TestClient>>,
        );
        assert!(matches!(result, Err(PoolError::InvalidConfiguration(_))));
    }
}
