//! Request scoring: feature transform followed by the classifier.

use crate::{
    artifacts::LoadedArtifacts,
    encoder::FeatureEncoder,
    metrics::InferenceMetrics,
    model::Classifier,
};
use ml_sentinel_core::{events::FeatureMap, schema::FeatureSchema, Error, Result};
use std::{sync::Arc, time::Instant};
use tracing::{debug, instrument, warn};

/// Immutable scoring pipeline shared by all request handlers
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    encoder: Arc<dyn FeatureEncoder>,
    model: Arc<dyn Classifier>,
    metrics: InferenceMetrics,
}

impl InferenceEngine {
    pub fn new(
        encoder: Arc<dyn FeatureEncoder>,
        model: Arc<dyn Classifier>,
        metrics: InferenceMetrics,
    ) -> Result<Self> {
        if model.input_width() != encoder.width() {
            return Err(Error::config(format!(
                "classifier expects {} inputs but the encoder produces {}",
                model.input_width(),
                encoder.width()
            )));
        }
        Ok(Self {
            encoder,
            model,
            metrics,
        })
    }

    /// Build from loaded artifacts
    pub fn from_artifacts(artifacts: &LoadedArtifacts, metrics: InferenceMetrics) -> Result<Self> {
        Self::new(artifacts.encoder.clone(), artifacts.model.clone(), metrics)
    }

    /// Positive-class probability for one feature map, without touching metrics.
    pub fn score(&self, features: &FeatureMap) -> Result<f64> {
        let vector = self.encoder.transform(features)?;
        let probability = self.model.predict_positive_probability(&vector)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidPrediction(probability));
        }
        Ok(probability)
    }

    /// Score a request and record it in the inference metrics.
    #[instrument(skip(self, features), fields(features = features.len()))]
    pub fn predict(&self, features: &FeatureMap) -> Result<f64> {
        let started = Instant::now();
        let result = self.score(features);
        self.metrics.observe(result.is_ok(), started.elapsed());

        match &result {
            Ok(probability) => debug!(probability, "Scored request"),
            Err(e) if e.is_client_error() => debug!(error = %e, "Rejected request features"),
            Err(e) => warn!(error = %e, "Scoring failed"),
        }
        result
    }

    pub fn metrics(&self) -> &InferenceMetrics {
        &self.metrics
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.encoder.schema()
    }
}
