//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    running: bool,
    listeners: usize,
    sequence: u64,
    predictions: usize,
}

/// Health check handler
///
/// Reports 503 when the broadcaster timers are not running.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let broadcaster = &state.broadcaster;
    let running = broadcaster.is_running();
    let snapshot = broadcaster.snapshot();

    let response = HealthResponse {
        status: (if running { "healthy" } else { "stopped" }).to_string(),
        running,
        listeners: broadcaster.listener_count(),
        sequence: snapshot.sequence,
        predictions: snapshot.prediction_count(),
    };

    let code = if running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
