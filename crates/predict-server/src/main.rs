//! Predict Server Binary
//!
//! Loads configuration and the model bundle, then serves the prediction API.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use predict_core::{load_predictor, ServiceConfig};
use predict_server::{serve, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("predict_server=info,predict_core=info,tower_http=info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::load()?;

    // No partial-availability mode: a bad bundle stops the process
    let predictor = load_predictor(&config).map_err(|e| {
        tracing::error!("Failed to load model bundle {:?}: {}", config.model_path(), e);
        e
    })?;

    let state = Arc::new(AppState::new(predictor));
    serve(&config.server.addr, state).await
}
