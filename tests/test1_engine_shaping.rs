use std::sync::Arc;

use sql_gateway::prelude::*;
use sql_gateway::test_utils::{FakeDriver, make_rows};

async fn ready_engine(driver: &FakeDriver) -> QueryEngine {
    let config = PoolConfig::new("fake").with_connection_limit(4);
    let pool = Arc::new(ConnectionPool::new(Arc::new(driver.clone()), config).unwrap());
    pool.initialize().await.unwrap();
    QueryEngine::new(pool)
}

#[tokio::test]
async fn query_single_and_scalar_shapes() {
    let driver = FakeDriver::new();
    let sql = "SELECT a, b FROM t";
    driver.script_rows(
        sql,
        make_rows(
            &["a", "b"],
            vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(3), Value::Int(4)],
            ],
        ),
    );
    let engine = ready_engine(&driver).await;

    let rows = engine.query(sql, &Params::None).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("a"), Some(&Value::Int(1)));
    assert_eq!(rows[1].get("b"), Some(&Value::Int(4)));

    let single = engine.fetch_single(sql, &Params::None).await.unwrap();
    assert_eq!(single.get("a"), Some(&Value::Int(1)));

    // Scalar is positional: first column of the first row.
    assert_eq!(engine.fetch_scalar(sql, &Params::None).await, Some(Value::Int(1)));

    // Aliases are pure renames.
    assert_eq!(engine.fetch_all(sql, &Params::None).await.len(), 2);
    assert_eq!(engine.scalar(sql, &Params::None).await, Some(Value::Int(1)));
}

#[tokio::test]
async fn insert_and_update_shapes() {
    let driver = FakeDriver::new();
    driver.script_result("INSERT INTO t (a) VALUES (?)", DriverResult::dml(1, 42));
    driver.script_result("UPDATE t SET a = ?", DriverResult::dml(3, 0));
    let engine = ready_engine(&driver).await;

    let id = engine
        .insert(
            "INSERT INTO t (a) VALUES (?)",
            &Params::positional([Value::Int(9)]),
        )
        .await;
    assert_eq!(id, 42);

    let affected = engine
        .update("UPDATE t SET a = ?", &Params::positional([Value::Int(9)]))
        .await;
    assert_eq!(affected, 3);
}

#[tokio::test]
async fn named_parameters_reach_the_driver_rewritten() {
    let driver = FakeDriver::new();
    let engine = ready_engine(&driver).await;

    engine
        .query(
            "SELECT * FROM users WHERE id = @id OR parent = @id",
            &Params::named([("id", Value::Int(7))]),
        )
        .await;

    let executed = driver.executed();
    assert_eq!(
        executed.last().map(String::as_str),
        Some("SELECT * FROM users WHERE id = ? OR parent = ?")
    );
}

#[tokio::test]
async fn router_dispatches_by_statement_kind() {
    let driver = FakeDriver::new();
    driver.script_result("INSERT INTO t (a) VALUES (1)", DriverResult::dml(1, 5));
    driver.script_result("DELETE FROM t", DriverResult::dml(2, 0));
    driver.script_rows(
        "SELECT a FROM t",
        make_rows(&["a"], vec![vec![Value::Int(1)]]),
    );
    let engine = ready_engine(&driver).await;

    let shaped = engine.execute("INSERT INTO t (a) VALUES (1)", &Params::None).await;
    assert_eq!(shaped.as_insert_id(), Some(5));

    let shaped = engine.execute("DELETE FROM t", &Params::None).await;
    assert_eq!(shaped.as_affected(), Some(2));

    let shaped = engine.execute("SELECT a FROM t", &Params::None).await;
    assert_eq!(shaped.as_rows().map(<[Row]>::len), Some(1));
    assert_eq!(shaped.scalar(), Some(&Value::Int(1)));

    // Unknown keyword defaults to the row-returning path.
    let shaped = engine.execute("PRAGMA journal_mode = WAL", &Params::None).await;
    assert!(matches!(shaped, Shaped::Rows(_)));
}

#[tokio::test]
async fn readiness_gating_never_contacts_the_driver() {
    let driver = FakeDriver::new();
    let config = PoolConfig::new("fake").with_connection_limit(2);
    let pool = Arc::new(ConnectionPool::new(Arc::new(driver.clone()), config).unwrap());
    // No initialize() call.
    let engine = QueryEngine::new(pool.clone());

    assert!(!pool.ready());
    assert!(engine.query("SELECT 1", &Params::None).await.is_empty());
    assert_eq!(engine.insert("INSERT INTO t VALUES (1)", &Params::None).await, 0);
    assert_eq!(engine.fetch_scalar("SELECT 1", &Params::None).await, None);
    assert!(matches!(
        engine.try_query("SELECT 1", &Params::None).await,
        Err(GatewayError::PoolNotReady)
    ));

    assert_eq!(driver.connections_opened(), 0);
    assert!(driver.executed().is_empty());
}

#[tokio::test]
async fn failures_are_swallowed_by_default_and_surfaced_by_try() {
    let driver = FakeDriver::new();
    driver.script_failure("SELECT boom", "syntax error near boom");
    let engine = ready_engine(&driver).await;

    assert!(engine.query("SELECT boom", &Params::None).await.is_empty());

    match engine.try_query("SELECT boom", &Params::None).await {
        Err(GatewayError::QueryFailed(message)) => {
            assert!(message.contains("syntax error"));
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }

    let stats = engine.pool().stats();
    assert_eq!(stats.failed_queries, 2);
}
