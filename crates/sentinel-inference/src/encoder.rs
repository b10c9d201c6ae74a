//! Feature transform capability and the bundled one-hot encoder.

use ml_sentinel_core::{
    events::{FeatureMap, FeatureValue},
    schema::FeatureSchema,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Turns a request's feature map into the numeric vector a [`Classifier`]
/// consumes.
///
/// [`Classifier`]: crate::model::Classifier
pub trait FeatureEncoder: Send + Sync + std::fmt::Debug {
    /// Schema the encoder was fitted on
    fn schema(&self) -> &FeatureSchema;

    /// Length of every vector returned by [`FeatureEncoder::transform`]
    fn width(&self) -> usize;

    /// Encode one feature map. Unknown categorical values must not fail.
    fn transform(&self, features: &FeatureMap) -> Result<Vec<f64>>;
}

/// On-disk layout of the encoder artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub schema: FeatureSchema,
    /// Known levels per categorical feature, in column order
    pub categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct CategoricalColumn {
    name: String,
    offset: usize,
    levels: HashMap<String, usize>,
}

/// One-hot encodes categorical features (schema order) and appends numeric
/// features unchanged (schema order).
///
/// Unknown or absent categorical values encode as an all-zero block. Numeric
/// features are required and must be JSON numbers.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    schema: FeatureSchema,
    categorical: Vec<CategoricalColumn>,
    numeric: Vec<String>,
    numeric_offset: usize,
}

impl OneHotEncoder {
    /// Build an encoder, checking that the categories agree with the schema.
    pub fn new(
        schema: FeatureSchema,
        mut categories: BTreeMap<String, Vec<String>>,
    ) -> std::result::Result<Self, String> {
        schema.validate()?;

        let mut categorical = Vec::new();
        let mut offset = 0;
        for feature in schema.categorical() {
            let levels = categories
                .remove(&feature.name)
                .ok_or_else(|| format!("no categories for categorical feature `{}`", feature.name))?;

            let mut index = HashMap::with_capacity(levels.len());
            for (i, level) in levels.into_iter().enumerate() {
                if index.insert(level.clone(), i).is_some() {
                    return Err(format!(
                        "category `{level}` listed twice for feature `{}`",
                        feature.name
                    ));
                }
            }

            let width = index.len();
            categorical.push(CategoricalColumn {
                name: feature.name.clone(),
                offset,
                levels: index,
            });
            offset += width;
        }

        if let Some(stray) = categories.keys().next() {
            return Err(format!(
                "categories given for `{stray}`, which is not a categorical feature of the schema"
            ));
        }

        let numeric = schema.numeric().map(|f| f.name.clone()).collect();

        Ok(Self {
            schema,
            categorical,
            numeric,
            numeric_offset: offset,
        })
    }

    /// Build from the parsed artifact
    pub fn from_artifact(artifact: EncoderArtifact) -> std::result::Result<Self, String> {
        Self::new(artifact.schema, artifact.categories)
    }

    fn numeric_value(name: &str, value: Option<&FeatureValue>) -> Result<f64> {
        match value {
            None | Some(FeatureValue::Null) => Err(Error::feature_transform(format!(
                "missing required numeric feature `{name}`"
            ))),
            Some(value) => value.as_f64().ok_or_else(|| {
                Error::feature_transform(format!(
                    "feature `{name}` must be numeric, got {}",
                    value.type_name()
                ))
            }),
        }
    }
}

impl FeatureEncoder for OneHotEncoder {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn width(&self) -> usize {
        self.numeric_offset + self.numeric.len()
    }

    fn transform(&self, features: &FeatureMap) -> Result<Vec<f64>> {
        let mut vector = vec![0.0; self.width()];

        for column in &self.categorical {
            let level = features
                .get(&column.name)
                .and_then(FeatureValue::category)
                .and_then(|value| column.levels.get(&value).copied());
            if let Some(i) = level {
                vector[column.offset + i] = 1.0;
            }
        }

        for (i, name) in self.numeric.iter().enumerate() {
            vector[self.numeric_offset + i] = Self::numeric_value(name, features.get(name))?;
        }

        Ok(vector)
    }
}
