//! Request and audit event types.

use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value-string used for a key that is absent from a row (or explicitly null).
pub const MISSING_VALUE: &str = "missing";

/// A single scalar feature value as received on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// JSON `null`, treated the same as an absent key
    Null,
    Bool(bool),
    /// Kept as a JSON number so integers stringify without a fractional part
    Number(serde_json::Number),
    Text(String),
}

impl FeatureValue {
    /// Numeric view of the value, only for JSON numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Stringified value used for categorical lookups and frequency tables.
    /// `None` for null.
    pub fn category(&self) -> Option<String> {
        match self {
            FeatureValue::Null => None,
            FeatureValue::Bool(b) => Some(b.to_string()),
            FeatureValue::Number(n) => Some(n.to_string()),
            FeatureValue::Text(s) => Some(s.clone()),
        }
    }

    /// Short name of the JSON type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureValue::Null => "null",
            FeatureValue::Bool(_) => "boolean",
            FeatureValue::Number(_) => "number",
            FeatureValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category() {
            Some(s) => f.write_str(&s),
            None => f.write_str(MISSING_VALUE),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<i32> for FeatureValue {
    fn from(value: i32) -> Self {
        FeatureValue::Number(value.into())
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value.into())
    }
}

impl From<f64> for FeatureValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(FeatureValue::Number)
            .unwrap_or(FeatureValue::Null)
    }
}

/// One request's named input values.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Stringified value of `key` in `row`, or [`MISSING_VALUE`].
pub fn category_of(row: &FeatureMap, key: &str) -> String {
    row.get(key)
        .and_then(FeatureValue::category)
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

/// One served prediction, as persisted in the audit log.
///
/// Constructed only through [`PredictionRecord::new`] / [`PredictionRecord::now`],
/// which reject probabilities outside [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Unix time in seconds
    #[serde(rename = "ts", alias = "timestamp")]
    timestamp: f64,
    features: FeatureMap,
    prediction: f64,
}

impl PredictionRecord {
    /// Create a record, failing loudly on an out-of-range prediction.
    pub fn new(timestamp: f64, features: FeatureMap, prediction: f64) -> Result<Self> {
        let record = Self {
            timestamp,
            features,
            prediction,
        };
        record.validate()?;
        Ok(record)
    }

    /// Create a record stamped with the current time.
    pub fn now(features: FeatureMap, prediction: f64) -> Result<Self> {
        let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self::new(timestamp, features, prediction)
    }

    /// Check the probability invariant; used again when records are read back.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.prediction) {
            return Err(Error::InvalidPrediction(self.prediction));
        }
        Ok(())
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn prediction(&self) -> f64 {
        self.prediction
    }

    pub fn into_features(self) -> FeatureMap {
        self.features
    }

    /// Serialize as a single newline-terminated JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_features() -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert("age".to_string(), 39.into());
        features.insert("workclass".to_string(), "Private".into());
        features.insert("hours_per_week".to_string(), 40.5.into());
        features.insert("veteran".to_string(), false.into());
        features
    }

    #[test]
    fn test_feature_value_parsing() {
        let features: FeatureMap = serde_json::from_str(
            r#"{"age": 39, "workclass": "Private", "ratio": 0.5, "flag": true, "note": null}"#,
        )
        .unwrap();

        assert_eq!(features["age"].as_f64(), Some(39.0));
        assert_eq!(features["workclass"], FeatureValue::Text("Private".to_string()));
        assert_eq!(features["flag"], FeatureValue::Bool(true));
        assert_eq!(features["note"], FeatureValue::Null);
        assert_eq!(features["workclass"].as_f64(), None);
    }

    #[test]
    fn test_nested_values_rejected() {
        assert!(serde_json::from_str::<FeatureMap>(r#"{"age": [39]}"#).is_err());
        assert!(serde_json::from_str::<FeatureMap>(r#"{"age": {"v": 39}}"#).is_err());
    }

    #[test]
    fn test_category_stringification() {
        let features = sample_features();
        assert_eq!(category_of(&features, "age"), "39");
        assert_eq!(category_of(&features, "hours_per_week"), "40.5");
        assert_eq!(category_of(&features, "workclass"), "Private");
        assert_eq!(category_of(&features, "veteran"), "false");
        assert_eq!(category_of(&features, "education"), MISSING_VALUE);
    }

    #[test]
    fn test_record_rejects_out_of_range_prediction() {
        assert!(matches!(
            PredictionRecord::new(0.0, FeatureMap::new(), 1.01),
            Err(Error::InvalidPrediction(_))
        ));
        assert!(PredictionRecord::new(0.0, FeatureMap::new(), -0.0001).is_err());
        assert!(PredictionRecord::new(0.0, FeatureMap::new(), f64::NAN).is_err());
        assert!(PredictionRecord::new(0.0, FeatureMap::new(), 0.0).is_ok());
        assert!(PredictionRecord::new(0.0, FeatureMap::new(), 1.0).is_ok());
    }

    #[test]
    fn test_record_json_line() {
        let record = PredictionRecord::new(1_700_000_000.25, sample_features(), 0.731).unwrap();
        let line = record.to_json_line().unwrap();

        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.starts_with(r#"{"ts":1700000000.25,"#));

        let parsed: PredictionRecord = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_accepts_timestamp_alias() {
        let parsed: PredictionRecord = serde_json::from_str(
            r#"{"timestamp": 12.5, "features": {"sex": "Male"}, "prediction": 0.25}"#,
        )
        .unwrap();
        assert_eq!(parsed.timestamp(), 12.5);
        assert_eq!(parsed.prediction(), 0.25);
    }

    fn finite_f64() -> impl Strategy<Value = f64> {
        any::<f64>().prop_filter("finite", |v| v.is_finite())
    }

    proptest! {
        #[test]
        fn test_record_floats_survive_json_line(
            prediction in 0.0..=1.0f64,
            hours in finite_f64(),
            ts in 0.0..4.0e9f64,
        ) {
            let mut features = sample_features();
            features.insert("hours_per_week".to_string(), hours.into());
            let record = PredictionRecord::new(ts, features, prediction).unwrap();

            let line = record.to_json_line().unwrap();
            let parsed: PredictionRecord = serde_json::from_str(line.trim_end()).unwrap();

            prop_assert_eq!(parsed.prediction().to_bits(), prediction.to_bits());
            prop_assert_eq!(parsed.timestamp().to_bits(), ts.to_bits());
            prop_assert_eq!(parsed.features()["hours_per_week"].as_f64(), Some(hours));
            prop_assert_eq!(parsed, record);
        }
    }
}
