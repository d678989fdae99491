mod dispatch;
mod transaction;

pub use dispatch::Shaped;
pub use transaction::TransactionOutcome;

use std::sync::Arc;

use tracing::error;

use crate::binding::bind;
use crate::error::GatewayError;
use crate::pool::ConnectionPool;
use crate::prepared::PreparedRegistry;
use crate::results::{DriverResult, Row};
use crate::sql_snippet;
use crate::types::{Params, QueryAndParams, Value};

/// The public operation surface: parameter binding, result shaping,
/// transactions, batches, and prepared-handle execution over one
/// [`ConnectionPool`].
///
/// Every operation follows the same skeleton: readiness check (inside the
/// pool), bind, execute, shape. The unprefixed methods are fail-soft: on any
/// failure they log and return the operation's zero value, so callers that
/// need to distinguish "empty" from "failed" use the `try_*` twins or watch
/// `failed_queries` in the pool stats.
pub struct QueryEngine {
    pool: Arc<ConnectionPool>,
    prepared: PreparedRegistry,
}

impl QueryEngine {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            prepared: PreparedRegistry::new(),
        }
    }

    /// Handle to the pool, for readiness polling and stats.
    #[must_use]
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Full row set.
    ///
    /// # Errors
    /// Propagates `PoolNotReady` and `QueryFailed`.
    pub async fn try_query(&self, sql: &str, params: &Params) -> Result<Vec<Row>, GatewayError> {
        let bound = bind(sql, params);
        let result = self.pool.execute(&bound.sql, &bound.args).await?;
        Ok(result.rows)
    }

    /// Full row set; empty on no match or failure.
    pub async fn query(&self, sql: &str, params: &Params) -> Vec<Row> {
        self.try_query(sql, params)
            .await
            .unwrap_or_else(|err| soft_zero("query", sql, &err))
    }

    /// First row of the result, if any.
    ///
    /// # Errors
    /// Propagates `PoolNotReady` and `QueryFailed`.
    pub async fn try_fetch_single(
        &self,
        sql: &str,
        params: &Params,
    ) -> Result<Option<Row>, GatewayError> {
        Ok(self.try_query(sql, params).await?.into_iter().next())
    }

    /// First row, or `None` on empty result or failure.
    pub async fn fetch_single(&self, sql: &str, params: &Params) -> Option<Row> {
        self.try_fetch_single(sql, params)
            .await
            .unwrap_or_else(|err| soft_zero("fetch_single", sql, &err))
    }

    /// First column of the first row, selected by field order.
    ///
    /// # Errors
    /// Propagates `PoolNotReady` and `QueryFailed`.
    pub async fn try_fetch_scalar(
        &self,
        sql: &str,
        params: &Params,
    ) -> Result<Option<Value>, GatewayError> {
        Ok(self
            .try_fetch_single(sql, params)
            .await?
            .and_then(|row| row.first_value().cloned()))
    }

    /// First column of the first row, or `None` on empty result or failure.
    pub async fn fetch_scalar(&self, sql: &str, params: &Params) -> Option<Value> {
        self.try_fetch_scalar(sql, params)
            .await
            .unwrap_or_else(|err| soft_zero("fetch_scalar", sql, &err))
    }

    /// Driver-reported auto-generated id.
    ///
    /// # Errors
    /// Propagates `PoolNotReady` and `QueryFailed`.
    pub async fn try_insert(&self, sql: &str, params: &Params) -> Result<u64, GatewayError> {
        let bound = bind(sql, params);
        let result = self.pool.execute(&bound.sql, &bound.args).await?;
        Ok(result.last_insert_id)
    }

    /// Driver-reported auto-generated id, or 0 when none or on failure.
    pub async fn insert(&self, sql: &str, params: &Params) -> u64 {
        self.try_insert(sql, params)
            .await
            .unwrap_or_else(|err| soft_zero("insert", sql, &err))
    }

    /// Affected-row count; covers UPDATE and DELETE.
    ///
    /// # Errors
    /// Propagates `PoolNotReady` and `QueryFailed`.
    pub async fn try_update(&self, sql: &str, params: &Params) -> Result<u64, GatewayError> {
        let bound = bind(sql, params);
        let result = self.pool.execute(&bound.sql, &bound.args).await?;
        Ok(result.affected_rows)
    }

    /// Affected-row count, or 0 on failure.
    pub async fn update(&self, sql: &str, params: &Params) -> u64 {
        self.try_update(sql, params)
            .await
            .unwrap_or_else(|err| soft_zero("update", sql, &err))
    }

    /// All-or-nothing execution of `entries` on one reserved connection.
    ///
    /// # Errors
    /// Returns `TransactionAborted` carrying the originating failure; the
    /// connection is back in the pool either way.
    pub async fn try_transaction(
        &self,
        entries: &[QueryAndParams],
    ) -> Result<Vec<DriverResult>, GatewayError> {
        transaction::run_transaction(&self.pool, entries).await
    }

    /// All-or-nothing execution; on failure the outcome reports
    /// `success == false` with no results.
    pub async fn transaction(&self, entries: &[QueryAndParams]) -> TransactionOutcome {
        match self.try_transaction(entries).await {
            Ok(results) => TransactionOutcome {
                success: true,
                results,
            },
            Err(err) => {
                log_soft_failure("transaction", "<multi-statement>", &err);
                TransactionOutcome {
                    success: false,
                    results: Vec::new(),
                }
            }
        }
    }

    /// Sequential fast-path execution with no shared transaction. Entries
    /// before a failing one stay applied.
    ///
    /// # Errors
    /// Propagates the first entry failure.
    pub async fn try_batch(
        &self,
        entries: &[QueryAndParams],
    ) -> Result<Vec<DriverResult>, GatewayError> {
        transaction::run_batch(&self.pool, entries).await
    }

    /// Sequential fast-path execution; the first failure aborts the batch and
    /// yields an empty list, without rolling back earlier entries.
    pub async fn batch(&self, entries: &[QueryAndParams]) -> Vec<DriverResult> {
        self.try_batch(entries)
            .await
            .unwrap_or_else(|err| soft_zero("batch", "<multi-statement>", &err))
    }

    /// Register a SQL string and return its opaque handle. Handles live until
    /// process exit; the registry never evicts.
    #[must_use]
    pub fn prepare_query(&self, sql: &str) -> String {
        self.prepared.register(sql)
    }

    /// Execute a previously prepared statement through the type router.
    ///
    /// # Errors
    /// `UnknownHandle` if the handle was never registered; otherwise the
    /// routed operation's errors.
    pub async fn try_execute_prepared(
        &self,
        handle: &str,
        params: &Params,
    ) -> Result<Shaped, GatewayError> {
        let sql = self
            .prepared
            .resolve(handle)
            .ok_or_else(|| GatewayError::UnknownHandle(handle.to_string()))?;
        self.try_execute(&sql, params).await
    }

    /// Execute a previously prepared statement; an unknown handle fails soft
    /// to the router's default row-returning zero value.
    pub async fn execute_prepared(&self, handle: &str, params: &Params) -> Shaped {
        match self.prepared.resolve(handle) {
            Some(sql) => self.execute(&sql, params).await,
            None => {
                log_soft_failure(
                    "execute_prepared",
                    handle,
                    &GatewayError::UnknownHandle(handle.to_string()),
                );
                Shaped::Rows(Vec::new())
            }
        }
    }

    // Compatibility aliases, pure renames of the operations above.

    /// Alias for [`QueryEngine::query`].
    pub async fn fetch_all(&self, sql: &str, params: &Params) -> Vec<Row> {
        self.query(sql, params).await
    }

    /// Alias for [`QueryEngine::fetch_single`].
    pub async fn single(&self, sql: &str, params: &Params) -> Option<Row> {
        self.fetch_single(sql, params).await
    }

    /// Alias for [`QueryEngine::fetch_scalar`].
    pub async fn scalar(&self, sql: &str, params: &Params) -> Option<Value> {
        self.fetch_scalar(sql, params).await
    }

    /// Alias for [`QueryEngine::prepare_query`].
    #[must_use]
    pub fn prepare(&self, sql: &str) -> String {
        self.prepare_query(sql)
    }
}

/// Log a swallowed failure with operation context. SQL text is truncated and
/// parameter values never reach the log.
fn log_soft_failure(operation: &str, sql: &str, err: &GatewayError) {
    error!(
        operation,
        sql = %sql_snippet(sql),
        error = %err,
        "operation failed; returning zero value"
    );
}

fn soft_zero<T: Default>(operation: &str, sql: &str, err: &GatewayError) -> T {
    log_soft_failure(operation, sql, err);
    T::default()
}
