use thiserror::Error;

/// Error taxonomy for the gateway.
///
/// The fail-soft entry points on [`crate::engine::QueryEngine`] convert these
/// into type-appropriate zero values at the operation boundary; the `try_*`
/// twins surface them directly.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The pool has not finished initializing, failed to initialize, or was closed.
    #[error("connection pool is not ready")]
    PoolNotReady,

    /// The driver reported a failure while executing a statement.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// `execute_prepared` was given a handle the registry does not know.
    #[error("unknown prepared handle: {0}")]
    UnknownHandle(String),

    /// A transaction entry failed and the transaction was rolled back.
    /// Carries the originating failure; a rollback error never replaces it.
    #[error("transaction aborted")]
    TransactionAborted {
        #[source]
        source: Box<GatewayError>,
    },

    /// Pool construction or the startup probe connection failed.
    #[error("pool initialization failed: {0}")]
    InitError(String),

    /// Invalid or unparseable configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A connection could not be obtained from or returned by the pool.
    #[error("connection error: {0}")]
    ConnectionError(String),
}

impl GatewayError {
    /// Wrap a failure as the cause of an aborted transaction.
    #[must_use]
    pub fn aborted(cause: GatewayError) -> Self {
        GatewayError::TransactionAborted {
            source: Box::new(cause),
        }
    }
}
