//! Model bundle loading
//!
//! A bundle is a single JSON document holding everything the service needs
//! to score a session the way the model was trained:
//!
//! - `schema`: ordered feature columns and category vocabularies
//! - `unseen_category`: `"missing"` or `"reject"`, required
//! - `features`: derivation settings such as the social-source allow-list
//! - `classifier`: the trained model, tagged by `type`
//!
//! Bundles are loaded once at startup. A bundle that fails to load or
//! validate is fatal; there is no partial-availability mode.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::schema::{EncodedValue, FeatureSchema, UnseenCategoryPolicy};
use super::tree::GradientBoostedTrees;
use super::Classifier;
use crate::error::{BundleError, ScoringError};
use crate::features::{FeatureConfig, FeatureRecord};

/// Classifier implementations a bundle may carry
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClassifierSpec {
    Gbdt(GradientBoostedTrees),
}

/// On-disk bundle layout
#[derive(Debug, Deserialize)]
struct BundleFile {
    name: String,
    #[serde(default)]
    version: String,
    schema: FeatureSchema,
    unseen_category: UnseenCategoryPolicy,
    #[serde(default)]
    features: FeatureConfig,
    classifier: ClassifierSpec,
}

/// A loaded, validated model bundle
#[derive(Debug, Clone)]
pub struct ModelBundle {
    name: String,
    version: String,
    schema: FeatureSchema,
    unseen_category: UnseenCategoryPolicy,
    features: FeatureConfig,
    classifier: Arc<dyn Classifier>,
}

impl ModelBundle {
    /// Assemble a bundle around any classifier
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        schema: FeatureSchema,
        unseen_category: UnseenCategoryPolicy,
        features: FeatureConfig,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, BundleError> {
        if classifier.num_features() != schema.len() {
            return Err(BundleError::InvalidSchema(format!(
                "classifier expects {} features, schema has {}",
                classifier.num_features(),
                schema.len()
            )));
        }

        Ok(Self {
            name: name.into(),
            version: version.into(),
            schema,
            unseen_category,
            features,
            classifier,
        })
    }

    /// Read and validate a bundle file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BundleError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let bundle = Self::from_json(&content)?;
        tracing::info!(
            "Loaded model bundle {} ({}) from {:?}: {} features, unseen categories -> {:?}",
            bundle.name,
            bundle.version,
            path,
            bundle.schema.len(),
            bundle.unseen_category
        );
        Ok(bundle)
    }

    /// Parse and validate a bundle document
    pub fn from_json(content: &str) -> Result<Self, BundleError> {
        let file: BundleFile = serde_json::from_str(content)?;

        let classifier: Arc<dyn Classifier> = match file.classifier {
            ClassifierSpec::Gbdt(model) => {
                model.validate(&file.schema)?;
                Arc::new(model)
            }
        };

        Self::new(
            file.name,
            file.version,
            file.schema,
            file.unseen_category,
            file.features,
            classifier,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn unseen_category(&self) -> UnseenCategoryPolicy {
        self.unseen_category
    }

    /// Derivation settings the model was trained with
    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    /// Encode a record into the classifier's row layout
    pub fn encode(&self, record: &FeatureRecord) -> Result<Vec<EncodedValue>, ScoringError> {
        let row = self.schema.encode(record, self.unseen_category)?;
        if row.len() != self.classifier.num_features() {
            return Err(ScoringError::ShapeMismatch {
                expected: self.classifier.num_features(),
                actual: row.len(),
            });
        }
        Ok(row)
    }

    /// Positive-class probability for a record
    pub fn score(&self, record: &FeatureRecord) -> Result<f64, ScoringError> {
        let row = self.encode(record)?;
        self.classifier.score(&row)
    }

    /// Class label for a record
    pub fn predict(&self, record: &FeatureRecord) -> Result<i64, ScoringError> {
        let row = self.encode(record)?;
        self.classifier.predict(&row)
    }
}
