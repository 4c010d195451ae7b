//! stocksim-server library
//!
//! Stock tracking simulator: quotes a watchlist, records simulated
//! purchases at the live price, and raises movement alerts from a
//! background monitor.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod launcher;
pub mod market;
pub mod monitor;
pub mod portfolio;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use market::Market;
use monitor::{MonitorSettings, MonitorStatus};
use portfolio::Portfolio;
use std::sync::Arc;
use stocksim_common::EventBus;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub portfolio: Arc<Portfolio>,
    pub market: Arc<Market>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Liveness of the market monitor task
    pub monitor: MonitorStatus,
    pub monitor_settings: MonitorSettings,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        portfolio: Arc<Portfolio>,
        market: Arc<Market>,
        event_bus: EventBus,
        monitor: MonitorStatus,
        monitor_settings: MonitorSettings,
    ) -> Self {
        Self {
            portfolio,
            market,
            event_bus,
            monitor,
            monitor_settings,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::market_routes())
        .merge(api::portfolio_routes())
        .merge(api::alert_routes())
        .merge(api::simulation_routes())
        .merge(api::status_routes())
        .merge(api::event_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
