// SQLite backend for the driver seam.
//
// rusqlite connections are synchronous and not Sync, so each pooled
// connection is serviced by a dedicated worker thread that owns the
// rusqlite::Connection; commands cross an mpsc channel and replies come back
// over oneshot channels (see worker.rs).

mod worker;

use async_trait::async_trait;

use crate::config::PoolConfig;
use crate::driver::{Driver, DriverConnection};
use crate::error::GatewayError;
use crate::results::DriverResult;
use crate::types::Value;

use worker::SqliteWorker;

/// File-backed (or shared-cache in-memory) SQLite driver. `config.database`
/// is the path; host/port/credentials are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(
        &self,
        config: &PoolConfig,
    ) -> Result<Box<dyn DriverConnection>, GatewayError> {
        let worker = SqliteWorker::spawn(config.database.clone()).await?;
        Ok(Box::new(SqliteConnection { worker }))
    }
}

struct SqliteConnection {
    worker: SqliteWorker,
}

#[async_trait]
impl DriverConnection for SqliteConnection {
    async fn execute(&mut self, sql: &str, args: &[Value]) -> Result<DriverResult, GatewayError> {
        self.worker.execute(sql.to_string(), args.to_vec()).await
    }

    async fn begin(&mut self) -> Result<(), GatewayError> {
        self.worker.batch("BEGIN".to_string()).await
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        self.worker.batch("COMMIT".to_string()).await
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        self.worker.batch("ROLLBACK".to_string()).await
    }

    async fn ping(&mut self) -> Result<(), GatewayError> {
        self.worker.ping().await
    }
}
