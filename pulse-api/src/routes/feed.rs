//! Feed read and control endpoints

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use pulse_core::{Prediction, Snapshot, SystemState};
use pulse_services::{PredictionQuery, PredictionSummary};
use serde::Serialize;
use tracing::{debug, info};

use crate::AppState;

/// Response for listing predictions
#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<Prediction>,
    pub count: usize,
}

/// Response for the boost toggle
#[derive(Debug, Serialize)]
pub struct BoostResponse {
    pub boost_enabled: bool,
}

/// Create feed routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/system-state", get(get_system_state))
        .route("/predictions", get(list_predictions))
        .route("/predictions/summary", get(get_summary))
        .route("/boost", post(toggle_boost))
}

async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.broadcaster.snapshot())
}

async fn get_system_state(State(state): State<AppState>) -> Json<SystemState> {
    Json(state.broadcaster.system_state())
}

/// List predictions with optional sport/confidence/state filters
async fn list_predictions(
    State(state): State<AppState>,
    Query(params): Query<PredictionQuery>,
) -> Json<PredictionsResponse> {
    debug!("Listing predictions with params: {:?}", params);

    let predictions = state.broadcaster.query(&params);
    Json(PredictionsResponse {
        count: predictions.len(),
        predictions,
    })
}

async fn get_summary(State(state): State<AppState>) -> Json<PredictionSummary> {
    Json(state.broadcaster.summary())
}

async fn toggle_boost(State(state): State<AppState>) -> Json<BoostResponse> {
    let boost_enabled = state.broadcaster.toggle_boost();
    info!("Boost toggled via API: {}", boost_enabled);
    Json(BoostResponse { boost_enabled })
}
