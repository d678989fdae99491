use async_trait::async_trait;

use crate::config::PoolConfig;
use crate::error::GatewayError;
use crate::results::DriverResult;
use crate::types::Value;

/// Factory for live database connections. The pool owns one driver and treats
/// the wire protocol, authentication, and socket timeouts as its concern.
///
/// Implementations: the built-in `SqliteDriver` (feature `sqlite`) and the
/// scripted `FakeDriver` (feature `test-utils`).
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Open one new connection.
    ///
    /// # Errors
    /// Returns `GatewayError::ConnectionError` if the backend is unreachable
    /// or rejects the configuration.
    async fn connect(&self, config: &PoolConfig)
    -> Result<Box<dyn DriverConnection>, GatewayError>;
}

/// One live connection. Statements sent through `execute` run with only
/// positional markers; binding happens before this seam.
#[async_trait]
pub trait DriverConnection: Send {
    /// Execute a single statement with positional arguments.
    ///
    /// # Errors
    /// Returns `GatewayError::QueryFailed` carrying the backend's message.
    async fn execute(&mut self, sql: &str, args: &[Value]) -> Result<DriverResult, GatewayError>;

    /// Start a transaction on this connection.
    ///
    /// # Errors
    /// Returns `GatewayError::QueryFailed` if the backend rejects it.
    async fn begin(&mut self) -> Result<(), GatewayError>;

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Returns `GatewayError::QueryFailed` if the commit fails.
    async fn commit(&mut self) -> Result<(), GatewayError>;

    /// Roll back the open transaction.
    ///
    /// # Errors
    /// Returns `GatewayError::QueryFailed` if the rollback itself fails.
    async fn rollback(&mut self) -> Result<(), GatewayError>;

    /// Cheap health check used by pool recycling and the startup probe.
    ///
    /// # Errors
    /// Returns `GatewayError::ConnectionError` if the connection is dead.
    async fn ping(&mut self) -> Result<(), GatewayError>;
}
