//! Model bundle and scoring
//!
//! - **Schema**: the training-time feature columns and category vocabularies
//! - **Tree**: the gradient boosted tree ensemble shipped in bundles
//! - **Bundle**: classifier + schema + derivation settings, loaded once at startup
//!
//! Scoring is single-shot: encode the record, classify the row. Any failure
//! (missing feature, unseen category under the reject policy, width mismatch)
//! fails the request; there is no fallback label.

pub mod bundle;
pub mod schema;
pub mod tree;

pub use bundle::ModelBundle;
pub use schema::{EncodedValue, FeatureKind, FeatureSchema, FeatureSpec, UnseenCategoryPolicy};
pub use tree::{GradientBoostedTrees, Node, Tree};

use std::fmt::Debug;

use crate::error::ScoringError;

/// A trained binary classifier over encoded rows
///
/// Implementations are read-only after construction and shared across
/// concurrent requests.
pub trait Classifier: Debug + Send + Sync {
    /// Row width the classifier was trained on
    fn num_features(&self) -> usize;

    /// Positive-class probability
    fn score(&self, row: &[EncodedValue]) -> Result<f64, ScoringError>;

    /// Class label for a row
    fn predict(&self, row: &[EncodedValue]) -> Result<i64, ScoringError>;
}
