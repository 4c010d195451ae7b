//! Database initialization tests

use stocksim_common::db::{init_database, init_memory_database};
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .expect("Should list tables")
}

#[tokio::test]
async fn test_init_creates_file_and_parent_folder() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("stocksim.db");

    let pool = init_database(&db_path).await.expect("Should create database");
    assert!(db_path.exists());

    let tables = table_names(&pool).await;
    assert!(tables.contains(&"positions".to_string()));
    assert!(tables.contains(&"alerts".to_string()));
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("stocksim.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO positions (transaction_id, symbol, buy_price, bought_at, current_price) \
         VALUES (1, 'TCS.NS', 100.0, '2024-01-01T00:00:00Z', 100.0)",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.expect("Reopen should succeed");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_memory_database_has_schema() {
    let pool = init_memory_database().await.unwrap();
    let tables = table_names(&pool).await;
    assert!(tables.contains(&"positions".to_string()));
}
