//! HTTP API handlers for stocksim-server

pub mod alerts;
pub mod extract;
pub mod market;
pub mod portfolio;
pub mod simulate;
pub mod sse;
pub mod status;
pub mod ui;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

pub use alerts::{latest_alerts, reset_alert, view_alerts};
pub use market::{buy_stock, list_stocks};
pub use portfolio::view_portfolio;
pub use simulate::{clear_simulation, simulate_price_movement};
pub use sse::event_stream;
pub use status::{get_build_info, health_check, system_status};
pub use ui::serve_index;

/// Dashboard pages
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/ui", get(serve_index))
}

/// Watchlist quotes and simulated purchases
pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(list_stocks))
        .route("/buy", post(buy_stock))
}

pub fn portfolio_routes() -> Router<AppState> {
    Router::new().route("/portfolio", get(view_portfolio))
}

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(view_alerts))
        .route("/alerts/latest", get(latest_alerts))
        .route("/reset-alert/:transaction_id", post(reset_alert))
}

/// Price override hooks for exercising alerts without market movement
pub fn simulation_routes() -> Router<AppState> {
    Router::new().route(
        "/simulate-price-movement/:transaction_id",
        post(simulate_price_movement).delete(clear_simulation),
    )
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(system_status))
        .route("/health", get(health_check))
        .route("/build_info", get(get_build_info))
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
