//! Error types for predict-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for prediction operations
pub type Result<T> = std::result::Result<T, PredictError>;

/// Main error type for prediction operations
#[derive(Error, Debug)]
pub enum PredictError {
    /// Model bundle could not be loaded
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Scoring a derived record failed
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Service configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating a model bundle
#[derive(Error, Debug)]
pub enum BundleError {
    /// Bundle file could not be read
    #[error("Failed to read bundle {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Bundle is not valid JSON or does not match the bundle layout
    #[error("Bundle parse error: {0}")]
    Parse(String),

    /// Feature schema is unusable
    #[error("Invalid feature schema: {0}")]
    InvalidSchema(String),

    /// A tree in the ensemble is malformed
    #[error("Invalid tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },
}

/// Errors raised while encoding or classifying a feature record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The record has no value for a feature the model expects
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// The record carries a value of the wrong kind for a feature
    #[error("Feature {feature} expected {expected} value, got {actual}")]
    TypeMismatch {
        feature: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A categorical value that was never seen during training
    #[error("Unseen category {value:?} for feature {feature}")]
    UnseenCategory { feature: String, value: String },

    /// Encoded row width does not match the classifier
    #[error("Shape mismatch: classifier expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Tree traversal left the node array or revisited a node
    #[error("Invalid tree node {node} (tree has {nodes} nodes)")]
    InvalidNode { node: usize, nodes: usize },
}

/// Errors raised while loading service configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Config file is not valid TOML
    #[error("Config parse error: {0}")]
    Parse(String),

    /// A configured value is invalid
    #[error("Invalid config value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
