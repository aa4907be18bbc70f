use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use board_shared::types::api::HealthResponse;

use crate::AppState;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("board-api", env!("CARGO_PKG_VERSION")))
}

/// Prometheus text exposition; empty when no recorder is installed.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
