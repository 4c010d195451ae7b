//! Service status, health and build identification

use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub monitoring_interval_seconds: u64,
    pub alert_threshold_percent: f64,
    pub watchlist: Vec<String>,
    pub price_source: String,
    pub active_positions: usize,
    pub total_alerts_triggered: usize,
    pub monitoring_enabled: bool,
    pub uptime_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct BuildInfoResponse {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// GET /status - monitor configuration and live counters
pub async fn system_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        monitoring_interval_seconds: state.monitor_settings.interval.as_secs(),
        alert_threshold_percent: state.monitor_settings.threshold_percent,
        watchlist: state.market.watchlist().symbols().to_vec(),
        price_source: state.market.source_name().to_string(),
        active_positions: state.portfolio.active_count().await,
        total_alerts_triggered: state.portfolio.total_alerts().await,
        monitoring_enabled: state.monitor.is_running(),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    })
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "stocksim-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /build_info
pub async fn get_build_info() -> Json<BuildInfoResponse> {
    Json(BuildInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}
