use tracing::warn;

use crate::classify::{StatementKind, classify};
use crate::error::GatewayError;
use crate::results::Row;
use crate::sql_snippet;
use crate::types::{Params, Value};

use super::QueryEngine;

/// Result of the type-routed `execute` entry point, shaped per the detected
/// statement kind.
#[derive(Debug, Clone)]
pub enum Shaped {
    /// SELECT (and unknown) statements: the full row set.
    Rows(Vec<Row>),
    /// INSERT statements: the auto-generated id.
    InsertId(u64),
    /// UPDATE/DELETE statements: the affected-row count.
    Affected(u64),
}

impl Shaped {
    #[must_use]
    pub fn as_rows(&self) -> Option<&[Row]> {
        if let Shaped::Rows(rows) = self {
            Some(rows)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_insert_id(&self) -> Option<u64> {
        if let Shaped::InsertId(id) = self {
            Some(*id)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_affected(&self) -> Option<u64> {
        if let Shaped::Affected(count) = self {
            Some(*count)
        } else {
            None
        }
    }

    /// Scalar view of a row-shaped result: first column of the first row.
    #[must_use]
    pub fn scalar(&self) -> Option<&Value> {
        self.as_rows()
            .and_then(|rows| rows.first())
            .and_then(Row::first_value)
    }
}

impl QueryEngine {
    /// Generic entry point: classify the statement and dispatch to the
    /// matching shaping operation. Unknown statements warn and take the
    /// row-returning path.
    pub async fn execute(&self, sql: &str, params: &Params) -> Shaped {
        match classify(sql) {
            StatementKind::Select => Shaped::Rows(self.query(sql, params).await),
            StatementKind::Insert => Shaped::InsertId(self.insert(sql, params).await),
            StatementKind::Update | StatementKind::Delete => {
                Shaped::Affected(self.update(sql, params).await)
            }
            StatementKind::Unknown => {
                warn!(
                    sql = %sql_snippet(sql),
                    "unrecognized statement keyword; defaulting to row-returning path"
                );
                Shaped::Rows(self.query(sql, params).await)
            }
        }
    }

    /// Classify-and-dispatch with explicit errors.
    ///
    /// # Errors
    /// Propagates the routed operation's errors.
    pub async fn try_execute(&self, sql: &str, params: &Params) -> Result<Shaped, GatewayError> {
        match classify(sql) {
            StatementKind::Select => Ok(Shaped::Rows(self.try_query(sql, params).await?)),
            StatementKind::Insert => Ok(Shaped::InsertId(self.try_insert(sql, params).await?)),
            StatementKind::Update | StatementKind::Delete => {
                Ok(Shaped::Affected(self.try_update(sql, params).await?))
            }
            StatementKind::Unknown => {
                warn!(
                    sql = %sql_snippet(sql),
                    "unrecognized statement keyword; defaulting to row-returning path"
                );
                Ok(Shaped::Rows(self.try_query(sql, params).await?))
            }
        }
    }
}
