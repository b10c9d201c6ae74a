//! Loading of the encoder and classifier artifacts.
//!
//! Artifacts are read once at startup. Any missing file, parse failure or
//! inconsistency between the two artifacts is an [`Error::ArtifactLoad`], and
//! the service must not start serving.

use crate::{
    encoder::{EncoderArtifact, FeatureEncoder, OneHotEncoder},
    model::{Classifier, LogisticRegression},
};
use ml_sentinel_core::{config::ArtifactConfig, Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{fs, path::Path, sync::Arc};
use tracing::info;

/// SHA-256 digests of the loaded artifact files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFingerprints {
    pub encoder_sha256: String,
    pub model_sha256: String,
}

/// The capability pair the inference engine is built from
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub encoder: Arc<dyn FeatureEncoder>,
    pub model: Arc<dyn Classifier>,
    pub fingerprints: ArtifactFingerprints,
}

/// Load both artifacts and check that the model consumes what the encoder produces.
pub fn load_artifacts(config: &ArtifactConfig) -> Result<LoadedArtifacts> {
    let (encoder, encoder_sha256) = load_encoder(&config.encoder_path)?;
    let (model, model_sha256) = load_model(&config.model_path)?;

    if model.input_width() != encoder.width() {
        return Err(Error::artifact(
            &config.model_path,
            format!(
                "model expects {} inputs but the encoder produces {}",
                model.input_width(),
                encoder.width()
            ),
        ));
    }

    info!(
        encoder = %config.encoder_path.display(),
        model = %config.model_path.display(),
        features = encoder.schema().len(),
        width = encoder.width(),
        encoder_sha256 = %encoder_sha256,
        model_sha256 = %model_sha256,
        "Artifacts loaded"
    );

    Ok(LoadedArtifacts {
        encoder: Arc::new(encoder),
        model: Arc::new(model),
        fingerprints: ArtifactFingerprints {
            encoder_sha256,
            model_sha256,
        },
    })
}

/// Load the one-hot encoder artifact, returning it with its digest.
pub fn load_encoder(path: &Path) -> Result<(OneHotEncoder, String)> {
    let (bytes, digest) = read_artifact(path)?;
    let artifact: EncoderArtifact = serde_json::from_slice(&bytes)
        .map_err(|e| Error::artifact(path, format!("invalid encoder artifact: {e}")))?;
    let encoder = OneHotEncoder::from_artifact(artifact).map_err(|e| Error::artifact(path, e))?;
    Ok((encoder, digest))
}

/// Load the logistic-regression artifact, returning it with its digest.
pub fn load_model(path: &Path) -> Result<(LogisticRegression, String)> {
    let (bytes, digest) = read_artifact(path)?;
    let model: LogisticRegression = serde_json::from_slice(&bytes)
        .map_err(|e| Error::artifact(path, format!("invalid model artifact: {e}")))?;
    model.validate().map_err(|e| Error::artifact(path, e))?;
    Ok((model, digest))
}

fn read_artifact(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes = fs::read(path).map_err(|e| Error::artifact(path, e.to_string()))?;
    let digest = format!("{:x}", Sha256::digest(&bytes));
    Ok((bytes, digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const ENCODER: &str = r#"{
        "schema": {"features": [
            {"name": "age", "kind": "numeric"},
            {"name": "sex", "kind": "categorical"}
        ]},
        "categories": {"sex": ["Female", "Male"]}
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_pair() {
        let dir = TempDir::new().unwrap();
        let config = ArtifactConfig {
            encoder_path: write(&dir, "encoder.json", ENCODER),
            model_path: write(
                &dir,
                "model.json",
                r#"{"coefficients": [0.1, -0.1, 0.02], "intercept": -1.0}"#,
            ),
        };

        let loaded = load_artifacts(&config).unwrap();
        assert_eq!(loaded.encoder.width(), 3);
        assert_eq!(loaded.model.input_width(), 3);
        assert_eq!(loaded.fingerprints.encoder_sha256.len(), 64);
        assert_ne!(
            loaded.fingerprints.encoder_sha256,
            loaded.fingerprints.model_sha256
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = ArtifactConfig {
            encoder_path: dir.path().join("absent.json"),
            model_path: dir.path().join("model.json"),
        };
        let err = load_artifacts(&config).unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_corrupt_model() {
        let dir = TempDir::new().unwrap();
        let config = ArtifactConfig {
            encoder_path: write(&dir, "encoder.json", ENCODER),
            model_path: write(&dir, "model.json", "\u{0}\u{1}pickle"),
        };
        assert!(matches!(
            load_artifacts(&config),
            Err(Error::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let config = ArtifactConfig {
            encoder_path: write(&dir, "encoder.json", ENCODER),
            model_path: write(&dir, "model.json", r#"{"coefficients": [0.1], "intercept": 0.0}"#),
        };
        let err = load_artifacts(&config).unwrap_err();
        assert!(err.to_string().contains("expects 1 inputs but the encoder produces 3"));
    }

    #[test]
    fn test_bundled_artifacts_are_consistent() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../artifacts");
        let config = ArtifactConfig {
            encoder_path: root.join("encoder.json"),
            model_path: root.join("model.json"),
        };
        let loaded = load_artifacts(&config).unwrap();
        assert_eq!(loaded.encoder.schema().len(), 14);
    }
}
