//! Feature schema and categorical encoding
//!
//! The schema is the training-time contract of a model bundle: which
//! features the classifier reads, in which column order, and for categorical
//! features the vocabulary whose positions are the category codes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, ScoringError};
use crate::features::{FeatureRecord, FeatureValue};

/// What to do with a categorical value missing from the training vocabulary
///
/// Bundles must state this explicitly; it depends on how the trained model
/// encoded its categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Fail the request
    Reject,
    /// Encode the value as missing and let the trees route it
    Missing,
}

/// Kind of a schema column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical { vocabulary: Vec<String> },
}

impl FeatureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical { .. } => "categorical",
        }
    }
}

/// One schema column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        vocabulary: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical {
                vocabulary: vocabulary.into_iter().map(Into::into).collect(),
            },
        }
    }
}

/// A feature value after encoding against the schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodedValue {
    Number(f64),
    /// Position of the category in the training vocabulary
    Category(u32),
    Missing,
}

/// Ordered feature columns with category code lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureSpec>", into = "Vec<FeatureSpec>")]
pub struct FeatureSchema {
    specs: Vec<FeatureSpec>,
    // One entry per spec; `None` for numeric columns
    codes: Vec<Option<HashMap<String, u32>>>,
}

impl FeatureSchema {
    /// Build a schema, rejecting duplicate names and duplicate categories
    pub fn new(specs: Vec<FeatureSpec>) -> Result<Self, BundleError> {
        if specs.is_empty() {
            return Err(BundleError::InvalidSchema(
                "schema has no features".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut codes = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(BundleError::InvalidSchema(format!(
                    "feature {index} has an empty name"
                )));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(BundleError::InvalidSchema(format!(
                    "duplicate feature {}",
                    spec.name
                )));
            }

            codes.push(match &spec.kind {
                FeatureKind::Numeric => None,
                FeatureKind::Categorical { vocabulary } => {
                    let mut lookup = HashMap::with_capacity(vocabulary.len());
                    for (code, category) in vocabulary.iter().enumerate() {
                        let code = u32::try_from(code).map_err(|_| {
                            BundleError::InvalidSchema(format!(
                                "vocabulary of {} is too large",
                                spec.name
                            ))
                        })?;
                        if lookup.insert(category.clone(), code).is_some() {
                            return Err(BundleError::InvalidSchema(format!(
                                "duplicate category {:?} in {}",
                                category, spec.name
                            )));
                        }
                    }
                    Some(lookup)
                }
            });
        }

        Ok(Self { specs, codes })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn get(&self, index: usize) -> Option<&FeatureSpec> {
        self.specs.get(index)
    }

    /// Number of categories for a categorical column
    pub fn vocabulary_len(&self, index: usize) -> Option<usize> {
        self.codes.get(index)?.as_ref().map(HashMap::len)
    }

    /// Encode a record into one row, in schema order
    pub fn encode(
        &self,
        record: &FeatureRecord,
        policy: UnseenCategoryPolicy,
    ) -> Result<Vec<EncodedValue>, ScoringError> {
        self.specs
            .iter()
            .zip(&self.codes)
            .map(|(spec, codes)| {
                let value = record
                    .get(&spec.name)
                    .ok_or_else(|| ScoringError::MissingFeature(spec.name.clone()))?;
                encode_value(spec, codes.as_ref(), value, policy)
            })
            .collect()
    }
}

fn encode_value(
    spec: &FeatureSpec,
    codes: Option<&HashMap<String, u32>>,
    value: &FeatureValue,
    policy: UnseenCategoryPolicy,
) -> Result<EncodedValue, ScoringError> {
    match (codes, value) {
        (_, FeatureValue::Missing) => Ok(EncodedValue::Missing),
        (None, FeatureValue::Numeric(v)) if v.is_nan() => Ok(EncodedValue::Missing),
        (None, FeatureValue::Numeric(v)) => Ok(EncodedValue::Number(*v)),
        (Some(codes), FeatureValue::Categorical(category)) => match codes.get(category) {
            Some(code) => Ok(EncodedValue::Category(*code)),
            None => match policy {
                UnseenCategoryPolicy::Missing => Ok(EncodedValue::Missing),
                UnseenCategoryPolicy::Reject => Err(ScoringError::UnseenCategory {
                    feature: spec.name.clone(),
                    value: category.clone(),
                }),
            },
        },
        (_, value) => Err(ScoringError::TypeMismatch {
            feature: spec.name.clone(),
            expected: spec.kind.name(),
            actual: value.kind_name(),
        }),
    }
}

impl TryFrom<Vec<FeatureSpec>> for FeatureSchema {
    type Error = BundleError;

    fn try_from(specs: Vec<FeatureSpec>) -> Result<Self, Self::Error> {
        Self::new(specs)
    }
}

impl From<FeatureSchema> for Vec<FeatureSpec> {
    fn from(schema: FeatureSchema) -> Self {
        schema.specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureSpec::numeric("visit_month"),
            FeatureSpec::categorical("device_category", ["desktop", "mobile", "tablet"]),
        ])
        .unwrap()
    }

    fn record(month: f64, category: &str) -> FeatureRecord {
        let mut record = FeatureRecord::new();
        record.insert("visit_month", FeatureValue::Numeric(month));
        record.insert("device_category", category);
        record
    }

    #[test]
    fn test_encode_in_schema_order() {
        let row = schema()
            .encode(&record(5.0, "mobile"), UnseenCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(
            row,
            vec![EncodedValue::Number(5.0), EncodedValue::Category(1)]
        );
    }

    #[test]
    fn test_extra_record_fields_ignored() {
        let mut record = record(1.0, "tablet");
        record.insert("session_id", "s1");

        let row = schema()
            .encode(&record, UnseenCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row[1], EncodedValue::Category(2));
    }

    #[test]
    fn test_unseen_category_rejected() {
        let err = schema()
            .encode(&record(5.0, "smart-tv"), UnseenCategoryPolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::UnseenCategory {
                feature: "device_category".to_string(),
                value: "smart-tv".to_string(),
            }
        );
    }

    #[test]
    fn test_unseen_category_as_missing() {
        let row = schema()
            .encode(&record(5.0, "smart-tv"), UnseenCategoryPolicy::Missing)
            .unwrap();
        assert_eq!(row[1], EncodedValue::Missing);
    }

    #[test]
    fn test_categories_are_case_sensitive() {
        let err = schema()
            .encode(&record(5.0, "Mobile"), UnseenCategoryPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ScoringError::UnseenCategory { .. }));
    }

    #[test]
    fn test_missing_feature() {
        let mut record = FeatureRecord::new();
        record.insert("visit_month", 5_u32);

        let err = schema()
            .encode(&record, UnseenCategoryPolicy::Missing)
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::MissingFeature("device_category".to_string())
        );
    }

    #[test]
    fn test_type_mismatch() {
        let mut record = record(5.0, "mobile");
        record.insert("visit_month", "May");

        let err = schema()
            .encode(&record, UnseenCategoryPolicy::Missing)
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::TypeMismatch {
                feature: "visit_month".to_string(),
                expected: "numeric",
                actual: "categorical",
            }
        );
    }

    #[test]
    fn test_missing_values_pass_through() {
        let mut record = FeatureRecord::new();
        record.insert("visit_month", FeatureValue::Numeric(f64::NAN));
        record.insert("device_category", None::<&str>);

        let row = schema()
            .encode(&record, UnseenCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(row, vec![EncodedValue::Missing, EncodedValue::Missing]);
    }

    #[test]
    fn test_duplicate_feature_rejected() {
        let err = FeatureSchema::new(vec![
            FeatureSpec::numeric("a"),
            FeatureSpec::numeric("a"),
        ])
        .unwrap_err();
        assert!(matches!(err, BundleError::InvalidSchema(_)));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = FeatureSchema::new(vec![FeatureSpec::categorical("c", ["x", "x"])]).unwrap_err();
        assert!(err.to_string().contains("duplicate category"));
    }

    #[test]
    fn test_deserialize_schema() {
        let json = r#"[
            {"name": "visit_month", "kind": "numeric"},
            {"name": "device_category", "kind": "categorical", "vocabulary": ["desktop", "mobile", "tablet"]}
        ]"#;
        let parsed: FeatureSchema = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, schema());
        assert_eq!(parsed.vocabulary_len(1), Some(3));
        assert_eq!(parsed.vocabulary_len(0), None);
    }

    #[test]
    fn test_deserialize_rejects_empty_schema() {
        assert!(serde_json::from_str::<FeatureSchema>("[]").is_err());
    }
}
