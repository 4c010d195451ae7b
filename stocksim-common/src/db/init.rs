//! Database initialization
//!
//! Opens (creating if needed) the SQLite journal that backs the simulated
//! portfolio and applies the idempotent schema.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open or create the database file and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database for `--ephemeral` runs and tests
///
/// Limited to a single connection: every SQLite `:memory:` connection is a
/// separate database, so the one connection is never recycled.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS positions (
            transaction_id INTEGER PRIMARY KEY,
            symbol TEXT NOT NULL,
            buy_price REAL NOT NULL,
            bought_at TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            alert_sent INTEGER NOT NULL DEFAULT 0,
            current_price REAL NOT NULL,
            percent_change REAL NOT NULL DEFAULT 0.0,
            alert_type TEXT,
            alert_triggered_at TEXT,
            simulated_current_price REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            alert_id TEXT PRIMARY KEY,
            transaction_id INTEGER NOT NULL REFERENCES positions(transaction_id),
            timestamp TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            percent_change REAL NOT NULL,
            current_price REAL NOT NULL,
            buy_price REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_alerts_transaction ON alerts(transaction_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
