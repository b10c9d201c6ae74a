//! Error type shared across the sentinel crates.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the serving path and the offline jobs.
#[derive(Debug, Error)]
pub enum Error {
    /// Model or encoder artifact missing, unreadable or inconsistent.
    /// Fatal at startup.
    #[error("failed to load artifact {}: {message}", path.display())]
    ArtifactLoad { path: PathBuf, message: String },

    /// The request's feature map cannot be transformed.
    #[error("{0}")]
    FeatureTransform(String),

    /// The scoring function produced a value outside [0, 1].
    #[error("prediction {0} is outside the probability range [0, 1]")]
    InvalidPrediction(f64),

    /// Appending to the audit log failed.
    #[error("audit write failed: {0}")]
    AuditWrite(String),

    /// The drift job ran before any baseline was persisted.
    #[error("no baseline found at {}", .0.display())]
    BaselineMissing(PathBuf),

    /// A training-data file could not be parsed.
    #[error("invalid training data: {0}")]
    TrainingData(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build an artifact load error.
    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a feature transform error.
    pub fn feature_transform(message: impl Into<String>) -> Self {
        Self::FeatureTransform(message.into())
    }

    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::FeatureTransform(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::feature_transform("missing `age`").is_client_error());
        assert!(!Error::InvalidPrediction(1.5).is_client_error());
        assert!(!Error::artifact("model.json", "not found").is_client_error());
    }

    #[test]
    fn test_messages() {
        let err = Error::BaselineMissing(PathBuf::from("artifacts/baseline.json"));
        assert_eq!(err.to_string(), "no baseline found at artifacts/baseline.json");

        let err = Error::feature_transform("feature `age` must be numeric");
        assert_eq!(err.to_string(), "feature `age` must be numeric");
    }
}
