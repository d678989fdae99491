//! Connection-pooled async SQL query gateway.
//!
//! Accepts raw SQL plus positional or named (`@identifier`) parameters,
//! executes through a bounded connection pool behind a driver trait seam, and
//! shapes results per operation: row sets, single row, scalar, insert id, or
//! affected rows. Atomic multi-statement transactions run on one reserved
//! connection; non-atomic batches run sequentially through the pool's fast
//! path. The pool keeps incremental runtime statistics and announces
//! readiness and slow queries on a broadcast side channel.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sql_gateway::prelude::*;
//!
//! # async fn demo() -> Result<(), GatewayError> {
//! let config = PoolConfig::new("app.db").with_connection_limit(4);
//! let pool = Arc::new(ConnectionPool::new(Arc::new(SqliteDriver), config)?);
//! pool.initialize().await?;
//!
//! let engine = QueryEngine::new(pool);
//! let rows = engine
//!     .query(
//!         "SELECT id, name FROM users WHERE id = @id",
//!         &Params::named([("id", Value::Int(1))]),
//!     )
//!     .await;
//! # let _ = rows;
//! # Ok(()) }
//! ```

pub mod binding;
pub mod classify;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod prepared;
pub mod results;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use binding::{BoundQuery, bind};
pub use classify::{StatementKind, classify};
pub use config::{PoolConfig, RedactedConfig};
pub use driver::{Driver, DriverConnection};
pub use engine::{QueryEngine, Shaped, TransactionOutcome};
pub use error::GatewayError;
pub use pool::{ConnectionPool, PoolEvent, PoolState, SLOW_QUERY_THRESHOLD_MS, StatsSnapshot};
pub use results::{DriverResult, Row};
pub use types::{Params, QueryAndParams, Value};

const SQL_SNIPPET_LEN: usize = 120;

/// Truncated SQL text for log lines; never include bound values next to it.
pub(crate) fn sql_snippet(sql: &str) -> &str {
    match sql.char_indices().nth(SQL_SNIPPET_LEN) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}
