//! Scripted driver double for exercising the pool and engine without a real
//! database. Enabled with the `test-utils` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::PoolConfig;
use crate::driver::{Driver, DriverConnection};
use crate::error::GatewayError;
use crate::results::{DriverResult, Row};
use crate::types::Value;

/// What a scripted statement should produce.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Result(DriverResult),
    Fail(String),
}

#[derive(Debug, Default)]
struct FakeState {
    scripts: Mutex<HashMap<String, FakeOutcome>>,
    log: Mutex<Vec<String>>,
    fail_connect: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    connections_opened: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl FakeState {
    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, FakeOutcome>> {
        match self.scripts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        match self.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Driver double: statements are matched by exact SQL text against scripted
/// outcomes; unscripted statements succeed with an empty result. Every
/// statement (including BEGIN/COMMIT/ROLLBACK) is recorded for assertions.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<FakeState>,
}

impl FakeDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_result(&self, sql: &str, result: DriverResult) {
        self.state
            .lock_scripts()
            .insert(sql.to_string(), FakeOutcome::Result(result));
    }

    pub fn script_rows(&self, sql: &str, rows: Vec<Row>) {
        self.script_result(sql, DriverResult::rows(rows));
    }

    pub fn script_failure(&self, sql: &str, message: &str) {
        self.state
            .lock_scripts()
            .insert(sql.to_string(), FakeOutcome::Fail(message.to_string()));
    }

    /// Artificial per-statement latency, for slow-query accounting tests.
    pub fn set_delay(&self, delay: Option<Duration>) {
        let mut guard = match self.state.delay.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = delay;
    }

    /// Make subsequent `connect` calls fail, for init-failure tests.
    pub fn fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make COMMIT fail, for commit-failure rollback tests.
    pub fn fail_commit(&self, fail: bool) {
        self.state.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Make ROLLBACK itself fail, for cause-masking tests.
    pub fn fail_rollback(&self, fail: bool) {
        self.state.fail_rollback.store(fail, Ordering::SeqCst);
    }

    /// Every statement executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.state.lock_log().clone()
    }

    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.state.connections_opened.load(Ordering::SeqCst)
    }
}

/// Build a row set from a column list and value rows.
#[must_use]
pub fn make_rows(columns: &[&str], data: Vec<Vec<Value>>) -> Vec<Row> {
    let names = Arc::new(
        columns
            .iter()
            .map(|c| (*c).to_string())
            .collect::<Vec<_>>(),
    );
    let index = Arc::new(Row::build_index(&names));
    data.into_iter()
        .map(|values| Row::with_index_cache(Arc::clone(&names), values, Arc::clone(&index)))
        .collect()
}

#[async_trait]
impl Driver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn connect(
        &self,
        _config: &PoolConfig,
    ) -> Result<Box<dyn DriverConnection>, GatewayError> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(GatewayError::ConnectionError(
                "scripted connect failure".to_string(),
            ));
        }
        self.state.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    state: Arc<FakeState>,
}

impl FakeConnection {
    fn record(&self, sql: &str) {
        self.state.lock_log().push(sql.to_string());
    }

    fn delay(&self) -> Option<Duration> {
        match self.state.delay.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DriverConnection for FakeConnection {
    async fn execute(&mut self, sql: &str, _args: &[Value]) -> Result<DriverResult, GatewayError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        self.record(sql);
        let outcome = self.state.lock_scripts().get(sql).cloned();
        match outcome {
            Some(FakeOutcome::Result(result)) => Ok(result),
            Some(FakeOutcome::Fail(message)) => Err(GatewayError::QueryFailed(message)),
            None => Ok(DriverResult::default()),
        }
    }

    async fn begin(&mut self) -> Result<(), GatewayError> {
        self.record("BEGIN");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        self.record("COMMIT");
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(GatewayError::QueryFailed(
                "scripted commit failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        self.record("ROLLBACK");
        if self.state.fail_rollback.load(Ordering::SeqCst) {
            return Err(GatewayError::QueryFailed(
                "scripted rollback failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), GatewayError> {
        Ok(())
    }
}
