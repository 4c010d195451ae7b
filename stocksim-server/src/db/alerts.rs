//! Alert history rows

use crate::portfolio::AlertRecord;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use stocksim_common::{events::AlertKind, Result};
use uuid::Uuid;

pub async fn insert_alert(pool: &SqlitePool, transaction_id: u64, alert: &AlertRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO alerts (
            alert_id, transaction_id, timestamp, alert_type,
            percent_change, current_price, buy_price
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(alert.alert_id.to_string())
    .bind(transaction_id as i64)
    .bind(alert.timestamp)
    .bind(alert.alert_type.as_str())
    .bind(alert.percent_change)
    .bind(alert.current_price)
    .bind(alert.buy_price)
    .execute(pool)
    .await?;
    Ok(())
}

/// All alerts as `(transaction_id, record)`, oldest first
pub async fn load_alerts(pool: &SqlitePool) -> Result<Vec<(u64, AlertRecord)>> {
    let rows = sqlx::query_as::<_, (String, i64, DateTime<Utc>, String, f64, f64, f64)>(
        r#"
        SELECT alert_id, transaction_id, timestamp, alert_type,
               percent_change, current_price, buy_price
        FROM alerts
        ORDER BY timestamp, rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(alert_id, transaction_id, timestamp, alert_type, percent_change, current_price, buy_price)| {
                let alert_id = Uuid::parse_str(&alert_id).map_err(|e| {
                    stocksim_common::Error::Internal(format!("Bad alert id {}: {}", alert_id, e))
                })?;
                Ok((
                    transaction_id as u64,
                    AlertRecord {
                        alert_id,
                        timestamp,
                        alert_type: alert_type.parse::<AlertKind>()?,
                        percent_change,
                        current_price,
                        buy_price,
                    },
                ))
            },
        )
        .collect()
}
