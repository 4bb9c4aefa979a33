//! Assembled feature record handed to the scorer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single feature value
///
/// Text fields are always carried as [`FeatureValue::Categorical`], never as
/// free text, so the scorer can map them onto the training vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
    Missing,
}

impl FeatureValue {
    /// Short name of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FeatureValue::Numeric(_) => "numeric",
            FeatureValue::Categorical(_) => "categorical",
            FeatureValue::Missing => "missing",
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Numeric(value as f64)
    }
}

impl From<u32> for FeatureValue {
    fn from(value: u32) -> Self {
        FeatureValue::Numeric(f64::from(value))
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Categorical(value.to_string())
    }
}

impl From<Option<&str>> for FeatureValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(FeatureValue::Missing, FeatureValue::from)
    }
}

/// Named feature values for one session, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    /// Numeric value of a feature, if present and numeric
    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_numeric)
    }

    /// Category of a feature, if present and categorical
    pub fn category(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FeatureValue::as_category)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut record = FeatureRecord::new();
        record.insert("visit_month", 5_u32);
        record.insert("geo_city", "Moscow");
        record.insert("utm_keyword", None::<&str>);

        assert_eq!(record.len(), 3);
        assert_eq!(record.numeric("visit_month"), Some(5.0));
        assert_eq!(record.category("geo_city"), Some("Moscow"));
        assert_eq!(record.get("utm_keyword"), Some(&FeatureValue::Missing));
        assert_eq!(record.numeric("geo_city"), None);
    }

    #[test]
    fn test_serializes_as_tagged_map() {
        let mut record = FeatureRecord::new();
        record.insert("is_social", 1_i64);
        record.insert("device_brand", "Apple");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "device_brand": {"kind": "categorical", "value": "Apple"},
                "is_social": {"kind": "numeric", "value": 1.0}
            })
        );
    }
}
