mod events;
mod manager;
mod stats;

pub use events::PoolEvent;
pub use manager::{DriverManager, PooledConnection};
pub use stats::{PoolStats, SLOW_QUERY_THRESHOLD_MS, StatsSnapshot};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use deadpool::managed::Pool;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::PoolConfig;
use crate::driver::Driver;
use crate::error::GatewayError;
use crate::results::DriverResult;
use crate::sql_snippet;
use crate::types::Value;

use events::PoolEvents;

/// Lifecycle of the pool. `Ready` is reached once, by a successful probe;
/// there is no path back from `Failed` or `Closed` short of a new pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
    Closed = 4,
}

impl PoolState {
    fn from_u8(raw: u8) -> PoolState {
        match raw {
            1 => PoolState::Initializing,
            2 => PoolState::Ready,
            3 => PoolState::Failed,
            4 => PoolState::Closed,
            _ => PoolState::Uninitialized,
        }
    }
}

/// Bounded pool of live driver connections, plus the runtime statistics
/// aggregate and the readiness state machine.
///
/// Constructed explicitly with an injected [`Driver`] and passed by handle to
/// every component that needs it; tests substitute a scripted driver through
/// the same seam.
pub struct ConnectionPool {
    inner: Pool<DriverManager>,
    state: AtomicU8,
    config: PoolConfig,
    stats: Mutex<PoolStats>,
    events: PoolEvents,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("state", &self.state_snapshot())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Build the pool structure without touching the network. The pool is not
    /// usable until [`ConnectionPool::initialize`] succeeds.
    ///
    /// # Errors
    /// Returns `GatewayError::InitError` if the pool cannot be constructed
    /// (e.g. a zero connection limit).
    pub fn new(driver: Arc<dyn Driver>, config: PoolConfig) -> Result<Self, GatewayError> {
        // A zero-capacity deadpool never fails a checkout, it parks forever.
        if config.connection_limit == 0 {
            return Err(GatewayError::InitError(
                "connection_limit must be at least 1".to_string(),
            ));
        }
        let manager = DriverManager::new(driver, config.clone());
        let inner = Pool::builder(manager)
            .max_size(config.connection_limit)
            .build()
            .map_err(|e| GatewayError::InitError(e.to_string()))?;

        Ok(Self {
            inner,
            state: AtomicU8::new(PoolState::Uninitialized as u8),
            config,
            stats: Mutex::new(PoolStats::default()),
            events: PoolEvents::new(),
        })
    }

    /// Checkout-and-release one probe connection, then declare readiness.
    ///
    /// A failed probe leaves the pool permanently not ready; there is no
    /// automatic retry. Callers that want retry own the backoff loop.
    ///
    /// # Errors
    /// Returns `GatewayError::InitError` on probe failure or when called in
    /// any state other than `Uninitialized`.
    pub async fn initialize(&self) -> Result<(), GatewayError> {
        if self
            .state
            .compare_exchange(
                PoolState::Uninitialized as u8,
                PoolState::Initializing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Err(GatewayError::InitError(format!(
                "initialize called in state {:?}",
                self.state_snapshot()
            )));
        }

        let probe = async {
            let mut conn = self.inner.get().await.map_err(manager::map_pool_error)?;
            conn.ping().await
        }
        .await;

        match probe {
            Ok(()) => {
                self.state.store(PoolState::Ready as u8, Ordering::SeqCst);
                info!(
                    host = %self.config.host,
                    database = %self.config.database,
                    connection_limit = self.config.connection_limit,
                    "connection pool ready"
                );
                self.events.emit(PoolEvent::Ready);
                Ok(())
            }
            Err(err) => {
                self.state.store(PoolState::Failed as u8, Ordering::SeqCst);
                error!(error = %err, "connection pool initialization failed");
                Err(GatewayError::InitError(err.to_string()))
            }
        }
    }

    /// Pure read of readiness. Never blocks, never touches the network.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.state_snapshot() == PoolState::Ready
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state_snapshot(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Single-statement fast path: checkout, execute, release, account.
    ///
    /// # Errors
    /// `GatewayError::PoolNotReady` before/after readiness,
    /// `GatewayError::QueryFailed` on driver errors (counted in
    /// `failed_queries`, excluded from the average).
    pub async fn execute(&self, sql: &str, args: &[Value]) -> Result<DriverResult, GatewayError> {
        if !self.ready() {
            return Err(GatewayError::PoolNotReady);
        }

        let start = Instant::now();
        let attempt = async {
            let mut conn = self.inner.get().await.map_err(manager::map_pool_error)?;
            conn.execute(sql, args).await
        }
        .await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match attempt {
            Ok(result) => {
                let slow = self.lock_stats().record_success(duration_ms);
                if slow {
                    warn!(duration_ms, sql = %sql_snippet(sql), "slow query");
                    self.events.emit(PoolEvent::SlowQuery {
                        sql: sql.to_string(),
                        duration_ms,
                        params: args.to_vec(),
                    });
                }
                Ok(result)
            }
            Err(err) => {
                self.lock_stats().record_failure();
                Err(err)
            }
        }
    }

    /// Explicit checkout for multi-statement atomic sequences. The connection
    /// returns to the pool when the guard drops, on every exit path.
    ///
    /// # Errors
    /// `GatewayError::PoolNotReady` if the pool is not ready,
    /// `GatewayError::ConnectionError` if checkout fails.
    pub async fn get_connection(&self) -> Result<PooledConnection, GatewayError> {
        if !self.ready() {
            return Err(GatewayError::PoolNotReady);
        }
        self.inner.get().await.map_err(manager::map_pool_error)
    }

    /// O(1) snapshot of the live aggregate plus readiness and redacted config.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let stats = self.lock_stats().clone();
        StatsSnapshot {
            total_queries: stats.total_queries,
            slow_queries: stats.slow_queries,
            failed_queries: stats.failed_queries,
            total_time_ms: stats.total_time_ms,
            average_time_ms: stats.average_time_ms,
            ready: self.ready(),
            config: self.config.redacted(),
        }
    }

    /// Subscribe to ready / slow-query notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    /// The configuration this pool was built with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drain and close all connections. Idempotent; a second call is a no-op.
    pub fn close(&self) {
        let previous = self.state.swap(PoolState::Closed as u8, Ordering::SeqCst);
        if PoolState::from_u8(previous) != PoolState::Closed {
            self.inner.close();
            info!(database = %self.config.database, "connection pool closed");
        }
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, PoolStats> {
        match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
