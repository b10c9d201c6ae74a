//! # Sentinel Inference
//!
//! The scoring half of the serving path:
//! - [`encoder::FeatureEncoder`] and the bundled one-hot encoder
//! - [`model::Classifier`] and the bundled logistic regression
//! - Artifact loading with SHA-256 fingerprints
//! - [`engine::InferenceEngine`], which combines both and records metrics

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod artifacts;
pub mod encoder;
pub mod engine;
pub mod metrics;
pub mod model;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::artifacts::{load_artifacts, ArtifactFingerprints, LoadedArtifacts};
    pub use crate::encoder::{EncoderArtifact, FeatureEncoder, OneHotEncoder};
    pub use crate::engine::InferenceEngine;
    pub use crate::metrics::InferenceMetrics;
    pub use crate::model::{Classifier, LogisticRegression};
}
