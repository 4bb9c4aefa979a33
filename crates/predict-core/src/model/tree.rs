//! Gradient boosted decision tree classifier
//!
//! Binary logistic ensemble. Each tree is a flat node array rooted at index 0;
//! children always sit after their parent, so traversal terminates.
//!
//! ```json
//! {
//!   "type": "gbdt",
//!   "num_features": 2,
//!   "base_score": -0.4,
//!   "threshold": 0.5,
//!   "trees": [
//!     {"nodes": [
//!       {"type": "categorical", "feature": 1, "left_categories": [1], "left": 1, "right": 2},
//!       {"type": "leaf", "value": 0.8},
//!       {"type": "numeric", "feature": 0, "threshold": 6.5, "left": 3, "right": 4, "default_left": true},
//!       {"type": "leaf", "value": -0.2},
//!       {"type": "leaf", "value": 0.1}
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::schema::{EncodedValue, FeatureKind, FeatureSchema};
use super::Classifier;
use crate::error::{BundleError, ScoringError};

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// `value <= threshold` goes left
    Numeric {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    /// Category codes in `left_categories` go left
    Categorical {
        feature: usize,
        left_categories: Vec<u32>,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    fn children(&self) -> Option<(usize, usize)> {
        match self {
            Node::Numeric { left, right, .. } | Node::Categorical { left, right, .. } => {
                Some((*left, *right))
            }
            Node::Leaf { .. } => None,
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Leaf value reached by a row
    ///
    /// Trees loaded through a bundle are validated first. A tree built by hand
    /// may still point past its node array or loop back on itself; both end in
    /// `ScoringError::InvalidNode` instead of a panic or a hang.
    pub fn evaluate(&self, row: &[EncodedValue]) -> Result<f64, ScoringError> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(index).ok_or(ScoringError::InvalidNode {
                node: index,
                nodes: self.nodes.len(),
            })?;

            index = match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => match column(row, *feature)? {
                    EncodedValue::Number(v) if v <= *threshold => *left,
                    EncodedValue::Number(_) => *right,
                    EncodedValue::Missing => branch(*default_left, *left, *right),
                    EncodedValue::Category(_) => {
                        return Err(mismatch(*feature, "numeric", "categorical"))
                    }
                },
                Node::Categorical {
                    feature,
                    left_categories,
                    left,
                    right,
                    default_left,
                } => match column(row, *feature)? {
                    EncodedValue::Category(code) => {
                        branch(left_categories.contains(&code), *left, *right)
                    }
                    EncodedValue::Missing => branch(*default_left, *left, *right),
                    EncodedValue::Number(_) => {
                        return Err(mismatch(*feature, "categorical", "numeric"))
                    }
                },
            };
        }

        // Every root-to-leaf path is shorter than the node count
        Err(ScoringError::InvalidNode {
            node: index,
            nodes: self.nodes.len(),
        })
    }

    fn validate(&self, tree: usize, schema: &FeatureSchema) -> Result<(), BundleError> {
        let invalid = |reason: String| BundleError::InvalidTree { tree, reason };

        if self.nodes.is_empty() {
            return Err(invalid("tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some((left, right)) = node.children() {
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(invalid(format!(
                            "node {index} has invalid child {child}"
                        )));
                    }
                }
            }

            match node {
                Node::Numeric {
                    feature, threshold, ..
                } => {
                    let spec = schema.get(*feature).ok_or_else(|| {
                        invalid(format!("node {index} reads unknown feature {feature}"))
                    })?;
                    if spec.kind != FeatureKind::Numeric {
                        return Err(invalid(format!(
                            "node {index} splits categorical feature {} numerically",
                            spec.name
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(format!("node {index} has a NaN threshold")));
                    }
                }
                Node::Categorical {
                    feature,
                    left_categories,
                    ..
                } => {
                    let spec = schema.get(*feature).ok_or_else(|| {
                        invalid(format!("node {index} reads unknown feature {feature}"))
                    })?;
                    let size = schema.vocabulary_len(*feature).ok_or_else(|| {
                        invalid(format!(
                            "node {index} splits numeric feature {} categorically",
                            spec.name
                        ))
                    })?;
                    if let Some(code) = left_categories.iter().find(|c| **c as usize >= size) {
                        return Err(invalid(format!(
                            "node {index} uses category code {code} outside the {} vocabulary",
                            spec.name
                        )));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(invalid(format!("leaf {index} is not finite")));
                    }
                }
            }
        }

        Ok(())
    }
}

fn column(row: &[EncodedValue], feature: usize) -> Result<EncodedValue, ScoringError> {
    row.get(feature)
        .copied()
        .ok_or(ScoringError::ShapeMismatch {
            expected: feature + 1,
            actual: row.len(),
        })
}

fn branch(go_left: bool, left: usize, right: usize) -> usize {
    if go_left {
        left
    } else {
        right
    }
}

fn mismatch(feature: usize, expected: &'static str, actual: &'static str) -> ScoringError {
    ScoringError::TypeMismatch {
        feature: format!("#{feature}"),
        expected,
        actual,
    }
}

fn default_threshold() -> f64 {
    0.5
}

/// Binary logistic tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub num_features: usize,
    /// Raw score added before the sigmoid
    #[serde(default)]
    pub base_score: f64,
    /// Probability at or above which the label is 1
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    pub fn new(num_features: usize, base_score: f64, trees: Vec<Tree>) -> Self {
        Self {
            num_features,
            base_score,
            threshold: default_threshold(),
            trees,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sum of base score and every tree's leaf
    pub fn raw_score(&self, row: &[EncodedValue]) -> Result<f64, ScoringError> {
        if row.len() != self.num_features {
            return Err(ScoringError::ShapeMismatch {
                expected: self.num_features,
                actual: row.len(),
            });
        }

        self.trees
            .iter()
            .try_fold(self.base_score, |acc, tree| Ok(acc + tree.evaluate(row)?))
    }

    /// Check the ensemble against the schema it will be fed with
    pub fn validate(&self, schema: &FeatureSchema) -> Result<(), BundleError> {
        if self.num_features != schema.len() {
            return Err(BundleError::InvalidSchema(format!(
                "classifier expects {} features, schema has {}",
                self.num_features,
                schema.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(BundleError::InvalidSchema(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if !self.base_score.is_finite() {
            return Err(BundleError::InvalidSchema(
                "base score is not finite".to_string(),
            ));
        }

        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(index, tree)| tree.validate(index, schema))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for GradientBoostedTrees {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn score(&self, row: &[EncodedValue]) -> Result<f64, ScoringError> {
        self.raw_score(row).map(sigmoid)
    }

    fn predict(&self, row: &[EncodedValue]) -> Result<i64, ScoringError> {
        let probability = self.score(row)?;
        Ok(i64::from(probability >= self.threshold))
    }
}
