//! Predict Core - Session conversion prediction
//!
//! This crate provides everything behind the prediction endpoint:
//!
//! - **Session**: the submitted web-visit record and the prediction it yields
//! - **Features**: deterministic derivation (date parts, weekend flag, screen
//!   size, social-source flag) with categorical text fields
//! - **Model**: model bundle loading, feature schema encoding and the
//!   gradient boosted tree classifier
//! - **Predictor**: feature derivation followed by scoring, shared read-only
//! - **Config**: service configuration loaded from TOML and the environment
//!
//! # Pipeline
//!
//! ```text
//! SessionInput → derive_features → FeatureRecord → FeatureSchema::encode → Classifier::predict
//! ```
//!
//! Derivation never fails: malformed dates and resolutions degrade to zeros.
//! Scoring fails hard on anything the bundle cannot encode.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod session;

pub use config::{ModelConfig, ServerConfig, ServiceConfig};
pub use error::{BundleError, ConfigError, PredictError, Result, ScoringError};
pub use features::{derive_features, FeatureConfig, FeatureRecord, FeatureValue};
pub use model::{Classifier, GradientBoostedTrees, ModelBundle, UnseenCategoryPolicy};
pub use predictor::Predictor;
pub use session::{Prediction, SessionInput};

/// Load configuration and the model bundle it points at
pub fn load_predictor(config: &ServiceConfig) -> Result<Predictor> {
    let bundle = ModelBundle::load(config.model_path())?;
    Ok(Predictor::new(bundle))
}
