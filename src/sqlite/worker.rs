use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::classify::{StatementKind, classify};
use crate::error::GatewayError;
use crate::results::{DriverResult, Row};
use crate::types::Value;

enum Command {
    Execute {
        sql: String,
        args: Vec<Value>,
        respond_to: oneshot::Sender<Result<DriverResult, GatewayError>>,
    },
    // BEGIN/COMMIT/ROLLBACK and other no-result statements.
    Batch {
        sql: String,
        respond_to: oneshot::Sender<Result<(), GatewayError>>,
    },
    Ping {
        respond_to: oneshot::Sender<Result<(), GatewayError>>,
    },
    Shutdown,
}

static WORKER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle to a dedicated thread owning one rusqlite connection.
pub(super) struct SqliteWorker {
    sender: Sender<Command>,
}

impl SqliteWorker {
    /// Spawn the worker thread and wait for it to report the connection-open
    /// outcome (rusqlite's URI handling covers `file::memory:?cache=shared`).
    pub(super) async fn spawn(path: String) -> Result<Self, GatewayError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (open_tx, open_rx) = oneshot::channel::<Result<(), GatewayError>>();
        let seq = WORKER_SEQ.fetch_add(1, Ordering::Relaxed);

        thread::Builder::new()
            .name(format!("sqlite-worker-{seq}"))
            .spawn(move || run_worker(&path, &receiver, open_tx))
            .map_err(|err| {
                GatewayError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        open_rx.await.map_err(|_| {
            GatewayError::ConnectionError(
                "SQLite worker exited before reporting open status".to_string(),
            )
        })??;

        Ok(Self { sender })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, GatewayError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, GatewayError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .map_err(|_| GatewayError::ConnectionError("SQLite worker closed".to_string()))?;
        rx.await
            .map_err(|_| GatewayError::ConnectionError(drop_message.to_string()))?
    }

    pub(super) async fn execute(
        &self,
        sql: String,
        args: Vec<Value>,
    ) -> Result<DriverResult, GatewayError> {
        self.request(
            |respond_to| Command::Execute {
                sql,
                args,
                respond_to,
            },
            "SQLite worker dropped while executing statement",
        )
        .await
    }

    pub(super) async fn batch(&self, sql: String) -> Result<(), GatewayError> {
        self.request(
            |respond_to| Command::Batch { sql, respond_to },
            "SQLite worker dropped while executing batch",
        )
        .await
    }

    pub(super) async fn ping(&self) -> Result<(), GatewayError> {
        self.request(
            |respond_to| Command::Ping { respond_to },
            "SQLite worker dropped while pinging",
        )
        .await
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn run_worker(
    path: &str,
    receiver: &Receiver<Command>,
    open_tx: oneshot::Sender<Result<(), GatewayError>>,
) {
    let conn = match Connection::open(path) {
        Ok(conn) => {
            let _ = open_tx.send(Ok(()));
            conn
        }
        Err(err) => {
            let _ = open_tx.send(Err(GatewayError::ConnectionError(format!(
                "failed to open SQLite database '{path}': {err}"
            ))));
            return;
        }
    };

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Execute {
                sql,
                args,
                respond_to,
            } => {
                let _ = respond_to.send(execute_statement(&conn, &sql, &args));
            }
            Command::Batch { sql, respond_to } => {
                let _ = respond_to.send(conn.execute_batch(&sql).map_err(query_failed));
            }
            Command::Ping { respond_to } => {
                let outcome = conn
                    .query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(|err| GatewayError::ConnectionError(err.to_string()));
                let _ = respond_to.send(outcome);
            }
            Command::Shutdown => break,
        }
    }
}

fn execute_statement(
    conn: &Connection,
    sql: &str,
    args: &[Value],
) -> Result<DriverResult, GatewayError> {
    let mut stmt = conn.prepare(sql).map_err(query_failed)?;
    let params: Vec<rusqlite::types::Value> = args.iter().map(value_to_sqlite).collect();

    if stmt.column_count() > 0 {
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let names = Arc::new(column_names);
        let index = Arc::new(Row::build_index(&names));

        let mut rows_iter = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(query_failed)?;
        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next().map_err(query_failed)? {
            let mut values = Vec::with_capacity(names.len());
            for idx in 0..names.len() {
                values.push(extract_value(row, idx)?);
            }
            rows.push(Row::with_index_cache(
                Arc::clone(&names),
                values,
                Arc::clone(&index),
            ));
        }
        Ok(DriverResult::rows(rows))
    } else {
        let affected = stmt
            .execute(rusqlite::params_from_iter(params))
            .map_err(query_failed)?;
        // last_insert_rowid is connection-global and carries over from earlier
        // statements; only INSERTs report it.
        let last_insert_id = if classify(sql) == StatementKind::Insert {
            u64::try_from(conn.last_insert_rowid()).unwrap_or(0)
        } else {
            0
        };
        Ok(DriverResult::dml(affected as u64, last_insert_id))
    }
}

fn value_to_sqlite(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Int(i) => Sql::Integer(*i),
        Value::Float(f) => Sql::Real(*f),
        Value::Text(s) => Sql::Text(s.clone()),
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Timestamp(dt) => Sql::Text(dt.format("%F %T%.f").to_string()),
        Value::Null => Sql::Null,
        Value::Json(json) => Sql::Text(json.to_string()),
        Value::Blob(bytes) => Sql::Blob(bytes.clone()),
    }
}

fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<Value, GatewayError> {
    let value: rusqlite::types::Value = row.get(idx).map_err(query_failed)?;
    Ok(match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(i) => Value::Int(i),
        rusqlite::types::Value::Real(f) => Value::Float(f),
        rusqlite::types::Value::Text(s) => Value::Text(s),
        rusqlite::types::Value::Blob(b) => Value::Blob(b),
    })
}

fn query_failed(err: rusqlite::Error) -> GatewayError {
    GatewayError::QueryFailed(err.to_string())
}
