//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use predict_core::{Prediction, ScoringError, SessionInput};

use crate::AppState;

/// Error body for rejected or failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Every body rejection maps to 422, whatever axum's own status would be
fn invalid_request(rejection: JsonRejection) -> ApiError {
    tracing::warn!(
        "Rejected prediction request ({}): {}",
        rejection.status(),
        rejection.body_text()
    );
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            detail: rejection.body_text(),
        }),
    )
}

fn scoring_failed(err: ScoringError) -> ApiError {
    tracing::error!("Scoring failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "scoring_failed".to_string(),
            detail: err.to_string(),
        }),
    )
}

/// Score one session
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionInput>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(input) = payload.map_err(invalid_request)?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id, session_id = %input.session_id);

    let prediction = span
        .in_scope(|| state.predictor.predict(&input))
        .map_err(scoring_failed)?;

    tracing::info!(
        %request_id,
        session_id = %prediction.session_id,
        prediction = prediction.prediction,
        "Scored session"
    );
    Ok(Json(prediction))
}

/// Service status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: String,
    pub version: String,
}

/// Get service status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let bundle = state.predictor.bundle();
    Json(StatusResponse {
        status: "Model is ready and running!".to_string(),
        model: bundle.name().to_string(),
        version: bundle.version().to_string(),
    })
}
