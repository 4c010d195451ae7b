//! Watchlist quotes and simulated purchases

use crate::error::{ApiError, ApiResult};
use crate::market::{StockQuote, Watchlist};
use crate::portfolio::Position;
use crate::AppState;
use super::extract::ApiJson;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct MarketDataResponse {
    pub market_data: Vec<StockQuote>,
}

#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
pub struct BuyResponse {
    pub message: String,
    pub transaction_id: u64,
    pub details: Position,
}

/// GET /stocks - live price of every watchlist symbol
pub async fn list_stocks(State(state): State<AppState>) -> Json<MarketDataResponse> {
    Json(MarketDataResponse {
        market_data: state.market.quote_watchlist().await,
    })
}

/// POST /buy - simulate buying one share at the live price
///
/// The live price is snapshotted as the position's buy price.
pub async fn buy_stock(
    State(state): State<AppState>,
    ApiJson(order): ApiJson<BuyRequest>,
) -> ApiResult<Json<BuyResponse>> {
    let symbol = Watchlist::normalize(&order.symbol);

    if !state.market.watchlist().contains(&symbol) {
        return Err(ApiError::BadRequest(
            "Stock not in supported watchlist".to_string(),
        ));
    }

    let execution_price = state
        .market
        .live_price(&symbol)
        .await
        .ok_or_else(|| ApiError::ServiceUnavailable("Market data unavailable".to_string()))?;

    let position = state.portfolio.open_position(&symbol, execution_price).await;

    info!(
        "Stock purchased: {} at ₹{} (Transaction #{})",
        symbol, execution_price, position.transaction_id
    );
    info!(
        "   Monitoring for ±{}% price movement...",
        state.monitor_settings.threshold_percent
    );

    Ok(Json(BuyResponse {
        message: "Stock purchased successfully - Real-time monitoring enabled".to_string(),
        transaction_id: position.transaction_id,
        details: position,
    }))
}
