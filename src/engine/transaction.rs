use tracing::warn;

use crate::binding::bind;
use crate::error::GatewayError;
use crate::pool::{ConnectionPool, PooledConnection};
use crate::results::DriverResult;
use crate::types::QueryAndParams;

/// Outcome of an atomic multi-statement transaction. `results` carries the
/// raw driver result per entry on success and is empty after a rollback.
#[derive(Debug, Default)]
pub struct TransactionOutcome {
    pub success: bool,
    pub results: Vec<DriverResult>,
}

/// Run `entries` on one reserved connection: BEGIN, each statement in order,
/// COMMIT. Any failure rolls the whole sequence back.
///
/// The connection is a pool guard, so it returns to the pool on every exit
/// path when it drops; a leaked checkout here would starve the pool.
pub(super) async fn run_transaction(
    pool: &ConnectionPool,
    entries: &[QueryAndParams],
) -> Result<Vec<DriverResult>, GatewayError> {
    let mut conn = pool.get_connection().await?;

    conn.begin().await.map_err(GatewayError::aborted)?;

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let bound = bind(&entry.query, &entry.params);
        match conn.execute(&bound.sql, &bound.args).await {
            Ok(result) => results.push(result),
            Err(cause) => {
                roll_back(&mut conn, &cause).await;
                return Err(GatewayError::aborted(cause));
            }
        }
    }

    if let Err(cause) = conn.commit().await {
        roll_back(&mut conn, &cause).await;
        return Err(GatewayError::aborted(cause));
    }

    Ok(results)
}

/// A rollback failure must not mask the error that triggered it; log it and
/// let the original cause propagate.
async fn roll_back(conn: &mut PooledConnection, original: &GatewayError) {
    if let Err(rollback_err) = conn.rollback().await {
        warn!(
            error = %rollback_err,
            cause = %original,
            "rollback failed after transaction error"
        );
    }
}

/// Run `entries` sequentially through the pool's fast path. No shared
/// transaction: ordering between entries is guaranteed, isolation from
/// concurrent writers is not, and earlier entries stay applied if a later one
/// fails.
pub(super) async fn run_batch(
    pool: &ConnectionPool,
    entries: &[QueryAndParams],
) -> Result<Vec<DriverResult>, GatewayError> {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let bound = bind(&entry.query, &entry.params);
        results.push(pool.execute(&bound.sql, &bound.args).await?);
    }
    Ok(results)
}
