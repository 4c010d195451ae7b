//! Portfolio view

use crate::portfolio::Position;
use crate::AppState;
use axum::{extract::State, Json};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub portfolio: BTreeMap<u64, Position>,
    pub total_positions: usize,
    pub active_positions: usize,
}

/// GET /portfolio - every position, active ones marked to the latest price
///
/// Marking is for the response only; stored prices change only when the
/// monitor scans. A simulated override takes precedence over live data.
pub async fn view_portfolio(State(state): State<AppState>) -> Json<PortfolioResponse> {
    let positions = state.portfolio.positions().await;
    let total_positions = positions.len();
    let active_positions = positions.values().filter(|p| p.is_active()).count();

    let marked = join_all(positions.into_values().map(|position| {
        let market = state.market.clone();
        async move {
            if !position.is_active() {
                return position;
            }
            let price = match position.simulated_current_price {
                Some(price) => Some(price),
                None => market.live_price(&position.symbol).await,
            };
            match price {
                Some(price) => position.repriced(price),
                None => position,
            }
        }
    }))
    .await;

    Json(PortfolioResponse {
        portfolio: marked
            .into_iter()
            .map(|p| (p.transaction_id, p))
            .collect(),
        total_positions,
        active_positions,
    })
}
