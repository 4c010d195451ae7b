//! Position rows

use crate::portfolio::{Position, PositionStatus};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use stocksim_common::{events::AlertKind, Error, Result};

type PositionRow = (
    i64,
    String,
    f64,
    DateTime<Utc>,
    String,
    bool,
    f64,
    f64,
    Option<String>,
    Option<DateTime<Utc>>,
    Option<f64>,
);

/// Insert or replace the full row for a position
pub async fn upsert_position(pool: &SqlitePool, position: &Position) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO positions (
            transaction_id, symbol, buy_price, bought_at, status, alert_sent,
            current_price, percent_change, alert_type, alert_triggered_at,
            simulated_current_price
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(transaction_id) DO UPDATE SET
            status = excluded.status,
            alert_sent = excluded.alert_sent,
            current_price = excluded.current_price,
            percent_change = excluded.percent_change,
            alert_type = excluded.alert_type,
            alert_triggered_at = excluded.alert_triggered_at,
            simulated_current_price = excluded.simulated_current_price
        "#,
    )
    .bind(position.transaction_id as i64)
    .bind(&position.symbol)
    .bind(position.buy_price)
    .bind(position.bought_at)
    .bind(position.status.as_str())
    .bind(position.alert_sent)
    .bind(position.current_price)
    .bind(position.percent_change)
    .bind(position.alert_type.map(|k| k.as_str()))
    .bind(position.alert_triggered_at)
    .bind(position.simulated_current_price)
    .execute(pool)
    .await?;
    Ok(())
}

/// All stored positions ordered by transaction id
pub async fn load_positions(pool: &SqlitePool) -> Result<Vec<Position>> {
    let rows = sqlx::query_as::<_, PositionRow>(
        r#"
        SELECT transaction_id, symbol, buy_price, bought_at, status, alert_sent,
               current_price, percent_change, alert_type, alert_triggered_at,
               simulated_current_price
        FROM positions
        ORDER BY transaction_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_position).collect()
}

fn row_to_position(row: PositionRow) -> Result<Position> {
    let (
        transaction_id,
        symbol,
        buy_price,
        bought_at,
        status,
        alert_sent,
        current_price,
        percent_change,
        alert_type,
        alert_triggered_at,
        simulated_current_price,
    ) = row;

    let status = PositionStatus::parse(&status).ok_or_else(|| {
        Error::Internal(format!(
            "Position {} has unknown status '{}'",
            transaction_id, status
        ))
    })?;
    let alert_type = alert_type
        .map(|s| s.parse::<AlertKind>())
        .transpose()?;

    Ok(Position {
        transaction_id: transaction_id as u64,
        symbol,
        buy_price,
        bought_at,
        status,
        alert_sent,
        current_price,
        percent_change,
        alert_type,
        alert_triggered_at,
        simulated_current_price,
    })
}
