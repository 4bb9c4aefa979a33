//! Predict Server - Session conversion prediction API
//!
//! HTTP server exposing the predictor:
//!
//! - `POST /predict`: score one session, returns `{session_id, prediction}`
//! - `GET /status`: readiness and loaded model

pub mod http;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use predict_core::Predictor;

/// Shared application state
///
/// Read-only after startup; handlers share it without locking.
pub struct AppState {
    pub predictor: Predictor,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(http::predict))
        .route("/status", get(http::get_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Predict server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
