use std::sync::Arc;

use deadpool::managed::{Manager, Metrics, Object, PoolError, RecycleError, RecycleResult};

use crate::config::PoolConfig;
use crate::driver::{Driver, DriverConnection};
use crate::error::GatewayError;

/// A checked-out connection. Dropping it returns the connection to the pool,
/// which is what makes the transaction path's release discipline automatic.
pub type PooledConnection = Object<DriverManager>;

/// Deadpool manager that opens connections through the injected driver and
/// pings them on recycle.
pub struct DriverManager {
    driver: Arc<dyn Driver>,
    config: PoolConfig,
}

impl DriverManager {
    pub(crate) fn new(driver: Arc<dyn Driver>, config: PoolConfig) -> Self {
        Self { driver, config }
    }
}

impl std::fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverManager")
            .field("driver", &self.driver.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Manager for DriverManager {
    type Type = Box<dyn DriverConnection>;
    type Error = GatewayError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.driver.connect(&self.config).await
    }

    async fn recycle(&self, conn: &mut Self::Type, _: &Metrics) -> RecycleResult<Self::Error> {
        conn.ping().await.map_err(RecycleError::Backend)
    }
}

/// Collapse deadpool's error wrapper: backend errors pass through untouched,
/// pool-side failures (timeout, closed) become `ConnectionError`.
pub(crate) fn map_pool_error(err: PoolError<GatewayError>) -> GatewayError {
    match err {
        PoolError::Backend(err) => err,
        other => GatewayError::ConnectionError(other.to_string()),
    }
}
