//! Integration tests for database migrations and connection pooling.
//!
//! Backed by the shared PostgreSQL instance from `quiver-test-utils`: each
//! test creates a unique temporary database, exercises the pool module
//! against it, and drops it on completion so tests are fully isolated.

use uuid::Uuid;

use quiver_db::config::DbConfig;
use quiver_db::pool;
use quiver_test_utils::{create_test_db, drop_test_db, pg_url};

/// Expected tables created by the initial migration.
const EXPECTED_TABLES: &[&str] = &[
    "exercises",
    "routine_day_exercises",
    "routine_days",
    "routines",
    "student_routine_assignments",
    "students",
    "users",
];

#[tokio::test]
async fn migrations_create_all_tables() {
    let (pool, db_name) = create_test_db().await;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' \
         ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");

    // Filter out the sqlx metadata table.
    let user_tables: Vec<&str> = rows
        .iter()
        .map(|(name,)| name.as_str())
        .filter(|t| !t.starts_with("_sqlx"))
        .collect();

    assert_eq!(
        user_tables, EXPECTED_TABLES,
        "migration should create exactly the expected tables"
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    // create_test_db already ran the migrations once.
    let (pool, db_name) = create_test_db().await;

    pool::run_migrations(&pool)
        .await
        .expect("second migration run should succeed (idempotent)");

    for table in EXPECTED_TABLES {
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: (i64,) = sqlx::query_as(&query)
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("failed to count {table}: {e}"));
        assert_eq!(count.0, 0, "table {table} should be empty after migrations");
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn table_counts_covers_every_table() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool)
        .await
        .expect("table_counts should succeed");

    // Filter out sqlx metadata.
    let user_counts: Vec<(&str, i64)> = counts
        .iter()
        .filter(|(name, _)| !name.starts_with("_sqlx"))
        .map(|(name, count)| (name.as_str(), *count))
        .collect();

    assert_eq!(user_counts.len(), EXPECTED_TABLES.len());
    for (name, count) in &user_counts {
        assert_eq!(*count, 0, "table {name} should be empty");
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_pool_connects_to_existing_database() {
    let (pool, db_name) = create_test_db().await;
    let base_url = pg_url().await;

    let config = DbConfig::new(format!("{base_url}/{db_name}"));
    let second = pool::create_pool(&config)
        .await
        .expect("create_pool should connect");

    let one: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(&second)
        .await
        .expect("simple query should work");
    assert_eq!(one.0, 1);

    second.close().await;
    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_database_exists_is_idempotent() {
    let base_url = pg_url().await;
    let db_name = format!("quiver_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{base_url}/{db_name}"));

    // First call creates the database, the second is a no-op.
    pool::ensure_database_exists(&config)
        .await
        .expect("first ensure should succeed");
    pool::ensure_database_exists(&config)
        .await
        .expect("second ensure should succeed (idempotent)");

    drop_test_db(&db_name).await;
}
