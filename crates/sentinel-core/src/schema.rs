//! Explicit feature schema shared by the encoder and the baseline builder.
//!
//! Serving-time feature keys and training-time column names agree because
//! both sides read the same ordered list of keys from here.

use serde::{Deserialize, Serialize};

/// Categorical keys tracked for drift when no explicit list is given.
pub const DEFAULT_DRIFT_KEYS: [&str; 5] = [
    "workclass",
    "education",
    "marital_status",
    "sex",
    "native_country",
];

/// How a feature is consumed by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Passed through as a number; must be present on every request
    Numeric,
    /// One-hot encoded; unknown or absent values are tolerated
    Categorical,
}

/// A single named feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
        }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical,
        }
    }
}

/// Ordered list of the features a model expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    pub fn new(features: Vec<FeatureSpec>) -> Self {
        Self { features }
    }

    /// The adult-census layout the bundled artifacts were trained on.
    pub fn adult_census() -> Self {
        Self::new(vec![
            FeatureSpec::numeric("age"),
            FeatureSpec::categorical("workclass"),
            FeatureSpec::numeric("fnlwgt"),
            FeatureSpec::categorical("education"),
            FeatureSpec::numeric("education_num"),
            FeatureSpec::categorical("marital_status"),
            FeatureSpec::categorical("occupation"),
            FeatureSpec::categorical("relationship"),
            FeatureSpec::categorical("race"),
            FeatureSpec::categorical("sex"),
            FeatureSpec::numeric("capital_gain"),
            FeatureSpec::numeric("capital_loss"),
            FeatureSpec::numeric("hours_per_week"),
            FeatureSpec::categorical("native_country"),
        ])
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Categorical features in schema order
    pub fn categorical(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features
            .iter()
            .filter(|f| f.kind == FeatureKind::Categorical)
    }

    /// Numeric features in schema order
    pub fn numeric(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter().filter(|f| f.kind == FeatureKind::Numeric)
    }

    /// Default drift keys restricted to categorical features of this schema.
    pub fn drift_keys(&self) -> Vec<String> {
        DEFAULT_DRIFT_KEYS
            .iter()
            .filter(|key| {
                self.get(key)
                    .is_some_and(|f| f.kind == FeatureKind::Categorical)
            })
            .map(|key| key.to_string())
            .collect()
    }

    /// Reject duplicated feature names.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.name.as_str()) {
                return Err(format!("feature `{}` is declared twice", feature.name));
            }
        }
        Ok(())
    }
}
