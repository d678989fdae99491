use std::sync::Arc;
use std::time::Duration;

use sql_gateway::prelude::*;
use sql_gateway::test_utils::FakeDriver;

const LIMIT: usize = 3;

async fn ready_pool(driver: &FakeDriver) -> Arc<ConnectionPool> {
    let config = PoolConfig::new("fake").with_connection_limit(LIMIT);
    let pool = Arc::new(ConnectionPool::new(Arc::new(driver.clone()), config).unwrap());
    pool.initialize().await.unwrap();
    pool
}

fn entries(sqls: &[&str]) -> Vec<QueryAndParams> {
    sqls.iter()
        .map(|sql| QueryAndParams::new_without_params(*sql))
        .collect()
}

#[tokio::test]
async fn transaction_commits_in_order_on_success() {
    let driver = FakeDriver::new();
    let engine = QueryEngine::new(ready_pool(&driver).await);

    let outcome = engine
        .transaction(&entries(&["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"]))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 2);

    let log = driver.executed();
    let begin = log.iter().position(|s| s == "BEGIN").unwrap();
    let commit = log.iter().position(|s| s == "COMMIT").unwrap();
    let first = log.iter().position(|s| s == "INSERT INTO t VALUES (1)").unwrap();
    let second = log.iter().position(|s| s == "INSERT INTO t VALUES (2)").unwrap();
    assert!(begin < first && first < second && second < commit);
}

#[tokio::test]
async fn failed_entry_rolls_back_and_releases_the_connection() {
    let driver = FakeDriver::new();
    driver.script_failure("INSERT INTO t VALUES (2)", "constraint violation");
    let pool = ready_pool(&driver).await;
    let engine = QueryEngine::new(pool.clone());

    let outcome = engine
        .transaction(&entries(&[
            "INSERT INTO t VALUES (1)",
            "INSERT INTO t VALUES (2)",
            "INSERT INTO t VALUES (3)",
        ]))
        .await;

    assert!(!outcome.success);
    assert!(outcome.results.is_empty());

    let log = driver.executed();
    assert!(log.contains(&"ROLLBACK".to_string()));
    assert!(!log.contains(&"COMMIT".to_string()));
    // The entry after the failing one never runs.
    assert!(!log.contains(&"INSERT INTO t VALUES (3)".to_string()));

    // The reserved connection went back: the whole pool is still acquirable.
    let mut held = Vec::new();
    for _ in 0..LIMIT {
        let conn = tokio::time::timeout(Duration::from_secs(1), pool.get_connection())
            .await
            .expect("pool starved: transaction leaked its connection")
            .unwrap();
        held.push(conn);
    }
}

#[tokio::test]
async fn commit_failure_rolls_back_and_releases_the_connection() {
    let driver = FakeDriver::new();
    driver.fail_commit(true);
    let pool = ready_pool(&driver).await;
    let engine = QueryEngine::new(pool.clone());

    let err = engine
        .try_transaction(&entries(&["INSERT INTO t VALUES (1)"]))
        .await
        .unwrap_err();

    match err {
        GatewayError::TransactionAborted { source } => match *source {
            GatewayError::QueryFailed(message) => assert!(message.contains("commit")),
            other => panic!("expected the commit QueryFailed as cause, got {other:?}"),
        },
        other => panic!("expected TransactionAborted, got {other:?}"),
    }

    // The failed commit was followed by a rollback on the same connection.
    let log = driver.executed();
    let commit = log.iter().position(|s| s == "COMMIT").unwrap();
    let rollback = log.iter().position(|s| s == "ROLLBACK").unwrap();
    assert!(commit < rollback);

    // And the connection went back: the whole pool is still acquirable.
    let mut held = Vec::new();
    for _ in 0..LIMIT {
        let conn = tokio::time::timeout(Duration::from_secs(1), pool.get_connection())
            .await
            .expect("pool starved: failed commit leaked its connection")
            .unwrap();
        held.push(conn);
    }
}

#[tokio::test]
async fn rollback_failure_does_not_mask_the_original_cause() {
    let driver = FakeDriver::new();
    driver.script_failure("INSERT INTO t VALUES (1)", "original failure");
    driver.fail_rollback(true);
    let engine = QueryEngine::new(ready_pool(&driver).await);

    let err = engine
        .try_transaction(&entries(&["INSERT INTO t VALUES (1)"]))
        .await
        .unwrap_err();

    match err {
        GatewayError::TransactionAborted { source } => match *source {
            GatewayError::QueryFailed(message) => assert!(message.contains("original failure")),
            other => panic!("expected the original QueryFailed, got {other:?}"),
        },
        other => panic!("expected TransactionAborted, got {other:?}"),
    }
}

#[tokio::test]
async fn transaction_on_unready_pool_fails_before_checkout() {
    let driver = FakeDriver::new();
    let config = PoolConfig::new("fake").with_connection_limit(LIMIT);
    let pool = Arc::new(ConnectionPool::new(Arc::new(driver.clone()), config).unwrap());
    let engine = QueryEngine::new(pool);

    let err = engine
        .try_transaction(&entries(&["INSERT INTO t VALUES (1)"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::PoolNotReady));
    assert_eq!(driver.connections_opened(), 0);
}

#[tokio::test]
async fn batch_is_sequential_and_non_atomic() {
    let driver = FakeDriver::new();
    driver.script_failure("INSERT INTO t VALUES (2)", "constraint violation");
    let engine = QueryEngine::new(ready_pool(&driver).await);

    let results = engine
        .batch(&entries(&[
            "INSERT INTO t VALUES (1)",
            "INSERT INTO t VALUES (2)",
            "INSERT INTO t VALUES (3)",
        ]))
        .await;

    // Fail-soft: the batch reports nothing on failure...
    assert!(results.is_empty());

    let log = driver.executed();
    // ...but entry 1 ran (and stays applied; no transaction, no rollback),
    // while entry 3 never started.
    assert!(log.contains(&"INSERT INTO t VALUES (1)".to_string()));
    assert!(!log.contains(&"INSERT INTO t VALUES (3)".to_string()));
    assert!(!log.contains(&"BEGIN".to_string()));
    assert!(!log.contains(&"ROLLBACK".to_string()));
}

#[tokio::test]
async fn successful_batch_returns_per_entry_results() {
    let driver = FakeDriver::new();
    driver.script_result("INSERT INTO t VALUES (1)", DriverResult::dml(1, 10));
    driver.script_result("INSERT INTO t VALUES (2)", DriverResult::dml(1, 11));
    let engine = QueryEngine::new(ready_pool(&driver).await);

    let results = engine
        .try_batch(&entries(&["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"]))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].last_insert_id, 10);
    assert_eq!(results[1].last_insert_id, 11);
}
