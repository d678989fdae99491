mod row;

pub use row::Row;

/// Raw outcome of one driver-level statement execution. Transaction and batch
/// entries surface this unshaped; single-statement operations shape it into
/// rows, a scalar, an insert id, or an affected count.
#[derive(Debug, Clone, Default)]
pub struct DriverResult {
    /// Rows returned by the statement (empty for DML).
    pub rows: Vec<Row>,
    /// Rows changed by a DML statement.
    pub affected_rows: u64,
    /// Auto-generated id reported by the backend, 0 if none.
    pub last_insert_id: u64,
}

impl DriverResult {
    /// Result for a DML statement with no row set.
    #[must_use]
    pub fn dml(affected_rows: u64, last_insert_id: u64) -> Self {
        Self {
            rows: Vec::new(),
            affected_rows,
            last_insert_id,
        }
    }

    /// Result carrying a row set.
    #[must_use]
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            affected_rows: 0,
            last_insert_id: 0,
        }
    }
}
