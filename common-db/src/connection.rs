//! Self-healing database handle.
//!
//! [`ConnectionManager`] owns the one handle a process uses. It is created
//! lazily by the first caller and then shared by everyone:
//!
//! - Settings are validated at construction; the first access opens the
//!   connection. Failures are never returned to callers. The manager logs,
//!   sleeps with exponential backoff and tries again, forever, so callers
//!   only see latency.
//! - Initialization is guarded by an async mutex with a double-checked read,
//!   so concurrent first callers wait for a single attempt instead of racing
//!   and leaking handles.
//! - Each established handle carries a generation. A caller that sees a
//!   transport failure hands that generation back to [`ConnectionManager::invalidate`];
//!   the next caller goes through the backoff path again. Stale generations
//!   are ignored, so a burst of failures closes the handle once. The stale
//!   handle is closed on a background task; the caller does not wait for
//!   its in-flight queries to drain.
//! - After [`ConnectionManager::close`], a connect that was still in its
//!   backoff loop releases its new handle instead of installing it.
//!
//! The driver is hidden behind [`Connector`] so the retry logic can be tested
//! without a running database.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::backoff::{Backoff, DEFAULT_INITIAL_DELAY};
use crate::config::{ConfigError, ConnectionSettings};
use crate::error::is_connectivity;

/// Default maximum connections behind the shared handle.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a single attempt may take before it counts as a failure.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens, checks and closes handles for one kind of store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    /// Whether this connector can serve the connection string's driver.
    fn supports(&self, _driver: &str) -> bool {
        true
    }

    async fn connect(&self, settings: &ConnectionSettings) -> Result<Self::Handle, sqlx::Error>;

    async fn ping(&self, handle: &Self::Handle) -> Result<(), sqlx::Error>;

    async fn close(&self, handle: Self::Handle);
}

/// PostgreSQL connector producing a [`PgPool`].
#[derive(Debug, Clone)]
pub struct PgConnector {
    max_connections: u32,
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(max_connections: u32) -> Self {
        Self {
            max_connections: max_connections.max(1),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for PgConnector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONNECTIONS)
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    fn supports(&self, driver: &str) -> bool {
        matches!(driver, "postgres" | "postgresql")
    }

    async fn connect(&self, settings: &ConnectionSettings) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .connect_with(settings.pg_options())
            .await
    }

    async fn ping(&self, handle: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(handle).await.map(|_| ())
    }

    async fn close(&self, handle: PgPool) {
        handle.close().await;
    }
}

/// A handle together with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct Lease<H> {
    generation: u64,
    handle: H,
}

impl<H> Lease<H> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }
}

impl<H> Deref for Lease<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

/// Owner of the process-wide database handle.
pub struct ConnectionManager<C: Connector = PgConnector> {
    connector: Arc<C>,
    settings: ConnectionSettings,
    initial_delay: Duration,
    slot: RwLock<Option<Lease<C::Handle>>>,
    init: Mutex<()>,
    generations: AtomicU64,
    closed: AtomicBool,
}

impl ConnectionManager<PgConnector> {
    /// PostgreSQL manager configured from `DB_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(PgConnector::default(), ConnectionSettings::from_env()?)
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Validate settings against the connector. Does not connect.
    pub fn new(connector: C, settings: ConnectionSettings) -> Result<Self, ConfigError> {
        if !connector.supports(&settings.driver) {
            return Err(ConfigError::UnsupportedDriver {
                driver: settings.driver,
            });
        }

        Ok(Self {
            connector: Arc::new(connector),
            settings,
            initial_delay: DEFAULT_INITIAL_DELAY,
            slot: RwLock::new(None),
            init: Mutex::new(()),
            generations: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Override the first backoff delay (doubles from there).
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// The shared handle, connecting first if needed.
    ///
    /// Blocks the calling task until a connection exists; never errors.
    pub async fn get(&self) -> C::Handle {
        self.lease().await.into_handle()
    }

    /// Like [`get`](Self::get), keeping the generation for [`invalidate`](Self::invalidate).
    pub async fn lease(&self) -> Lease<C::Handle> {
        if let Some(lease) = self.try_lease().await {
            return lease;
        }

        let _init = self.init.lock().await;

        // Someone else may have connected while we waited for the guard.
        if let Some(lease) = self.try_lease().await {
            return lease;
        }

        let handle = self.connect_with_backoff().await;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let lease = Lease { generation, handle };

        let mut slot = self.slot.write().await;
        if self.closed.load(Ordering::SeqCst) {
            drop(slot);
            warn!(generation, "manager closed while connecting, releasing new handle");
            self.connector.close(lease.handle.clone()).await;
            return lease;
        }
        *slot = Some(lease.clone());
        lease
    }

    /// The current handle without waiting for a connection.
    pub async fn try_lease(&self) -> Option<Lease<C::Handle>> {
        self.slot.read().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Check the established handle. `None` while no handle exists.
    ///
    /// A transport failure invalidates the handle, same as a failed query.
    pub async fn ping(&self) -> Option<Result<(), sqlx::Error>> {
        let lease = self.try_lease().await?;
        let result = self.connector.ping(lease.handle()).await;
        if let Err(err) = &result {
            if is_connectivity(err) {
                self.invalidate(lease.generation()).await;
            }
        }
        Some(result)
    }

    /// Drop the handle of `generation` so the next caller reconnects.
    ///
    /// Returns `false` if that generation is no longer current.
    pub async fn invalidate(&self, generation: u64) -> bool {
        let stale = {
            let mut slot = self.slot.write().await;
            match slot.as_ref() {
                Some(current) if current.generation == generation => slot.take(),
                _ => None,
            }
        };

        match stale {
            Some(lease) => {
                warn!(generation, "database handle invalidated, next caller reconnects");
                let connector = Arc::clone(&self.connector);
                tokio::spawn(async move {
                    connector.close(lease.handle).await;
                });
                true
            }
            None => false,
        }
    }

    /// Release the handle. Meant for graceful shutdown.
    ///
    /// Waits for the pool to drain. A connect still in progress releases its
    /// handle when it finishes instead of installing it.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let current = self.slot.write().await.take();
        if let Some(lease) = current {
            self.connector.close(lease.handle).await;
            info!(generation = lease.generation, "database connection closed");
        }
    }

    async fn connect_with_backoff(&self) -> C::Handle {
        let mut backoff = Backoff::new(self.initial_delay);
        let mut attempt: u64 = 1;

        loop {
            match self.connector.connect(&self.settings).await {
                Ok(handle) => {
                    info!(
                        attempt,
                        host = %self.settings.host,
                        dbname = %self.settings.dbname,
                        "database connection established"
                    );
                    return handle;
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    warn!(
                        attempt,
                        error = %err,
                        wait_secs = delay.as_secs_f64(),
                        "database is unavailable, waiting before retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// Fails a fixed number of times, then hands out its attempt number.
    #[derive(Default)]
    struct FlakyConnector {
        failures: AtomicUsize,
        attempts: std::sync::Mutex<Vec<Instant>>,
        closed: AtomicUsize,
        link_down: AtomicBool,
    }

    impl FlakyConnector {
        fn failing(times: usize) -> Self {
            Self {
                failures: AtomicUsize::new(times),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Connector for Arc<FlakyConnector> {
        type Handle = usize;

        async fn connect(&self, _: &ConnectionSettings) -> Result<usize, sqlx::Error> {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                attempts.push(Instant::now());
                attempts.len()
            };
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(attempt)
        }

        async fn ping(&self, _: &usize) -> Result<(), sqlx::Error> {
            if self.link_down.load(Ordering::SeqCst) {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(())
        }

        async fn close(&self, _: usize) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings::parse("postgres@alice:secret/db.host:5432/orders").unwrap()
    }

    fn manager(connector: &Arc<FlakyConnector>) -> ConnectionManager<Arc<FlakyConnector>> {
        ConnectionManager::new(Arc::clone(connector), settings()).unwrap()
    }

    /// Let background close tasks run.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn connects_lazily_and_reuses_handle() {
        let connector = Arc::new(FlakyConnector::default());
        let manager = manager(&connector);

        assert!(!manager.is_connected().await);
        assert!(manager.ping().await.is_none());
        assert!(connector.attempts.lock().unwrap().is_empty());

        assert_eq!(manager.get().await, 1);
        assert_eq!(manager.get().await, 1);
        assert_eq!(connector.attempts.lock().unwrap().len(), 1);
        assert!(manager.is_connected().await);
        assert!(matches!(manager.ping().await, Some(Ok(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_doubling_delay() {
        let connector = Arc::new(FlakyConnector::failing(4));
        let manager = manager(&connector);

        let started = Instant::now();
        let handle = manager.get().await;

        assert_eq!(handle, 5);
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4 + 8));

        let attempts = connector.attempts.lock().unwrap().clone();
        let waits: Vec<_> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_initial_delay() {
        let connector = Arc::new(FlakyConnector::failing(2));
        let manager = manager(&connector).with_initial_delay(Duration::from_millis(100));

        let started = Instant::now();
        manager.get().await;
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_callers_share_one_initialization() {
        let connector = Arc::new(FlakyConnector::failing(1));
        let manager = Arc::new(manager(&connector));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.lease().await.generation() })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), 1);
        }

        // One failed attempt, one success, nothing abandoned.
        assert_eq!(connector.attempts.lock().unwrap().len(), 2);
        assert_eq!(connector.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_reconnect_once() {
        let connector = Arc::new(FlakyConnector::default());
        let manager = manager(&connector);

        let first = manager.lease().await;
        assert!(manager.invalidate(first.generation()).await);
        assert!(!manager.invalidate(first.generation()).await);
        settle().await;
        assert_eq!(connector.closed.load(Ordering::SeqCst), 1);
        assert!(!manager.is_connected().await);

        let second = manager.lease().await;
        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(*second, 2);

        // A late report about the old generation leaves the new handle alone.
        assert!(!manager.invalidate(first.generation()).await);
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn failed_ping_drops_the_handle() {
        let connector = Arc::new(FlakyConnector::default());
        let manager = manager(&connector);

        manager.get().await;
        connector.link_down.store(true, Ordering::SeqCst);
        assert!(matches!(manager.ping().await, Some(Err(_))));
        assert!(!manager.is_connected().await);
        settle().await;
        assert_eq!(connector.closed.load(Ordering::SeqCst), 1);

        connector.link_down.store(false, Ordering::SeqCst);
        assert_eq!(manager.get().await, 2);
    }

    #[tokio::test]
    async fn close_releases_handle() {
        let connector = Arc::new(FlakyConnector::default());
        let manager = manager(&connector);

        manager.close().await;
        assert_eq!(connector.closed.load(Ordering::SeqCst), 0);

        manager.get().await;
        manager.close().await;
        assert_eq!(connector.closed.load(Ordering::SeqCst), 1);
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn invalidate_does_not_wait_for_close() {
        let connector = Arc::new(FlakyConnector::default());
        let manager = manager(&connector);

        let lease = manager.lease().await;
        assert!(manager.invalidate(lease.generation()).await);
        // Handle is out of the slot before the close has run.
        assert!(!manager.is_connected().await);
        assert_eq!(connector.closed.load(Ordering::SeqCst), 0);

        settle().await;
        assert_eq!(connector.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_backoff_releases_late_handle() {
        let connector = Arc::new(FlakyConnector::failing(2));
        let manager = Arc::new(manager(&connector));

        let pending = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.lease().await.generation() })
        };

        // First attempt failed; the lease is waiting out its 1s backoff.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(connector.attempts.lock().unwrap().len(), 1);

        manager.close().await;
        assert!(manager.is_closed());

        assert_eq!(pending.await.unwrap(), 1);
        assert!(!manager.is_connected().await);
        assert_eq!(connector.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pg_connector_rejects_other_drivers() {
        let settings = ConnectionSettings::parse("mysql@alice:secret/db.host:3306/orders").unwrap();
        let err = ConnectionManager::new(PgConnector::default(), settings)
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigError::UnsupportedDriver {
                driver: "mysql".into()
            }
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pg_manager_connects() {
        let manager = ConnectionManager::from_env().expect("DB_URL required");
        let pool = manager.get().await;

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);
        assert!(matches!(manager.ping().await, Some(Ok(()))));

        manager.close().await;
    }
}
