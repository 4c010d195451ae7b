//! Alert history and alert reset

use crate::error::ApiResult;
use crate::portfolio::{AlertRecord, LatestAlert, LATEST_ALERTS_LIMIT};
use crate::AppState;
use super::extract::ApiPath;
use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct AlertHistoryResponse {
    pub alert_history: BTreeMap<u64, Vec<AlertRecord>>,
    pub total_alerts: usize,
}

#[derive(Debug, Serialize)]
pub struct LatestAlertsResponse {
    pub latest_alerts: Vec<LatestAlert>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /alerts - full alert history per transaction
pub async fn view_alerts(State(state): State<AppState>) -> Json<AlertHistoryResponse> {
    let alert_history = state.portfolio.alert_history().await;
    let total_alerts = alert_history.values().map(Vec::len).sum();
    Json(AlertHistoryResponse {
        alert_history,
        total_alerts,
    })
}

/// GET /alerts/latest - newest alert per transaction, most recent first
pub async fn latest_alerts(State(state): State<AppState>) -> Json<LatestAlertsResponse> {
    let (latest_alerts, total) = state.portfolio.latest_alerts(LATEST_ALERTS_LIMIT).await;
    Json(LatestAlertsResponse {
        latest_alerts,
        total,
    })
}

/// POST /reset-alert/:transaction_id - re-arm alerts for a position
pub async fn reset_alert(
    State(state): State<AppState>,
    ApiPath(transaction_id): ApiPath<u64>,
) -> ApiResult<Json<MessageResponse>> {
    state.portfolio.reset_alert(transaction_id).await?;
    info!(transaction_id, "Alert reset");
    Ok(Json(MessageResponse {
        message: format!(
            "Alert reset for transaction #{}. Monitoring will trigger new alerts.",
            transaction_id
        ),
    }))
}
