//! Convenient imports for common functionality.

pub use crate::binding::{BoundQuery, bind};
pub use crate::classify::{StatementKind, classify};
pub use crate::config::{PoolConfig, RedactedConfig};
pub use crate::driver::{Driver, DriverConnection};
pub use crate::engine::{QueryEngine, Shaped, TransactionOutcome};
pub use crate::error::GatewayError;
pub use crate::pool::{ConnectionPool, PoolEvent, PoolState, SLOW_QUERY_THRESHOLD_MS, StatsSnapshot};
pub use crate::results::{DriverResult, Row};
pub use crate::types::{Params, QueryAndParams, Value};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
