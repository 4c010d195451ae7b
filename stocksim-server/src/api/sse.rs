//! Server-Sent Events stream of simulator events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - positions, price marks and alerts as they happen
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stocksim_common::sse::create_event_sse_stream(&state.event_bus, "stocksim-server")
}
