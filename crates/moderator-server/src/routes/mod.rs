//! HTTP surface: the observer WebSocket plus two read-only endpoints.

pub mod api;
pub mod ws;

use axum::Router;
use axum::routing::get;

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/stats", get(api::stats_handler))
        .route("/health", get(api::health_handler))
        .with_state(state)
}
