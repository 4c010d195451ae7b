//! Simulated price overrides
//!
//! Lets a user push a position past the alert threshold without waiting for
//! the real market to move.

use super::alerts::MessageResponse;
use crate::error::ApiResult;
use crate::AppState;
use super::extract::{ApiJson, ApiPath};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SimulatePriceRequest {
    pub simulated_current_price: f64,
}

#[derive(Debug, Serialize)]
pub struct SimulatePriceResponse {
    pub message: String,
    pub buy_price: f64,
    pub simulated_current_price: f64,
    pub expected_percent_change: f64,
    pub note: String,
}

/// POST /simulate-price-movement/:transaction_id
pub async fn simulate_price_movement(
    State(state): State<AppState>,
    ApiPath(transaction_id): ApiPath<u64>,
    ApiJson(request): ApiJson<SimulatePriceRequest>,
) -> ApiResult<Json<SimulatePriceResponse>> {
    let preview = state
        .portfolio
        .set_simulated_price(transaction_id, request.simulated_current_price)
        .await?;

    info!(
        transaction_id,
        "Simulated price set to ₹{} ({:+.2}%)",
        preview.simulated_current_price,
        preview.expected_percent_change
    );

    Ok(Json(SimulatePriceResponse {
        message: format!("Simulated current price for transaction #{}", transaction_id),
        buy_price: preview.buy_price,
        simulated_current_price: preview.simulated_current_price,
        expected_percent_change: preview.expected_percent_change,
        note: format!(
            "Next monitoring cycle will use this simulated price. Alert will trigger if ±{}% threshold is crossed.",
            state.monitor_settings.threshold_percent
        ),
    }))
}

/// DELETE /simulate-price-movement/:transaction_id
pub async fn clear_simulation(
    State(state): State<AppState>,
    ApiPath(transaction_id): ApiPath<u64>,
) -> ApiResult<Json<MessageResponse>> {
    state.portfolio.clear_simulated_price(transaction_id).await?;
    info!(transaction_id, "Simulation cleared");
    Ok(Json(MessageResponse {
        message: format!(
            "Simulation cleared for transaction #{}. Using real market data.",
            transaction_id
        ),
    }))
}
