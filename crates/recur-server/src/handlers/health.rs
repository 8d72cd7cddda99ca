//! Health check

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Provider name, or "demo" when none is configured
    pub provider: String,
    /// Store name, or "none"
    pub store: String,
}

/// GET /api/health - Liveness and wiring
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.service.provider_name().unwrap_or("demo").to_string(),
        store: state.service.store_name().unwrap_or("none").to_string(),
    })
}
