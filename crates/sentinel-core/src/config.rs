//! Environment-driven configuration.
//!
//! Every setting has a default so the service starts with no environment at
//! all. Values that are present but invalid are rejected rather than silently
//! replaced by the default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8000;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default classifier artifact location
pub const DEFAULT_MODEL_PATH: &str = "artifacts/model.json";

/// Default encoder artifact location
pub const DEFAULT_ENCODER_PATH: &str = "artifacts/encoder.json";

/// Default audit log location
pub const DEFAULT_REQUEST_LOG: &str = "ops/data/live_requests.jsonl";

/// Default audit queue capacity
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Default baseline location
pub const DEFAULT_BASELINE_PATH: &str = "artifacts/baseline_feature_freq.json";

/// Default drift alert threshold
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.2;

/// Default number of recent audit records inspected by the drift job
pub const DEFAULT_DRIFT_WINDOW: usize = 1000;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Locations of the encoder and classifier artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            encoder_path: PathBuf::from(DEFAULT_ENCODER_PATH),
        }
    }
}

/// Audit log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Newline-delimited JSON log of served predictions
    pub log_path: PathBuf,
    /// Bounded queue size between request handlers and the writer task
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_REQUEST_LOG),
            queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
        }
    }
}

/// Drift job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Persisted baseline frequency table
    pub baseline_path: PathBuf,
    /// Keys whose discrepancy reaches this value raise an alert
    pub threshold: f64,
    /// Number of most recent audit records compared against the baseline
    pub window: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            baseline_path: PathBuf::from(DEFAULT_BASELINE_PATH),
            threshold: DEFAULT_DRIFT_THRESHOLD,
            window: DEFAULT_DRIFT_WINDOW,
        }
    }
}

impl DriftConfig {
    /// Reject thresholds and windows the detector cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::config(format!(
                "drift threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.window == 0 {
            return Err(Error::config("drift window must be at least 1"));
        }
        Ok(())
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub audit: AuditConfig,
    pub drift: DriftConfig,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("SENTINEL_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(&lookup, "SENTINEL_PORT", DEFAULT_PORT)?,
            request_timeout_secs: parse_var(
                &lookup,
                "SENTINEL_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        };

        let artifacts = ArtifactConfig {
            model_path: path_var(&lookup, &["MODEL_PATH"], DEFAULT_MODEL_PATH),
            encoder_path: path_var(&lookup, &["ENCODER_PATH"], DEFAULT_ENCODER_PATH),
        };

        // REQUEST_LOG and LIVE_LOG name the same file; REQUEST_LOG wins.
        let audit = AuditConfig {
            log_path: path_var(&lookup, &["REQUEST_LOG", "LIVE_LOG"], DEFAULT_REQUEST_LOG),
            queue_capacity: parse_var(
                &lookup,
                "AUDIT_QUEUE_CAPACITY",
                DEFAULT_AUDIT_QUEUE_CAPACITY,
            )?,
        };
        if audit.queue_capacity == 0 {
            return Err(Error::config("AUDIT_QUEUE_CAPACITY must be at least 1"));
        }

        let drift = DriftConfig {
            baseline_path: path_var(&lookup, &["BASELINE_PATH"], DEFAULT_BASELINE_PATH),
            threshold: parse_var(&lookup, "DRIFT_THRESHOLD", DEFAULT_DRIFT_THRESHOLD)?,
            window: parse_var(&lookup, "DRIFT_WINDOW", DEFAULT_DRIFT_WINDOW)?,
        };
        drift.validate()?;

        debug!(
            model = %artifacts.model_path.display(),
            encoder = %artifacts.encoder_path.display(),
            audit_log = %audit.log_path.display(),
            baseline = %drift.baseline_path.display(),
            "Configuration loaded"
        );

        Ok(Self {
            server,
            artifacts,
            audit,
            drift,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("invalid value for {key} ({raw:?}): {e}"))),
        None => Ok(default),
    }
}

fn path_var<F>(lookup: &F, keys: &[&str], default: &str) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.artifacts.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.audit.log_path, PathBuf::from(DEFAULT_REQUEST_LOG));
        assert_eq!(config.drift.threshold, 0.2);
        assert_eq!(config.drift.window, 1000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/srv/model.json"),
            ("ENCODER_PATH", "/srv/encoder.json"),
            ("REQUEST_LOG", "/var/log/requests.jsonl"),
            ("BASELINE_PATH", "/srv/baseline.json"),
            ("DRIFT_THRESHOLD", "0.35"),
            ("DRIFT_WINDOW", "250"),
            ("SENTINEL_PORT", "9100"),
        ]))
        .unwrap();

        assert_eq!(config.artifacts.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.artifacts.encoder_path, PathBuf::from("/srv/encoder.json"));
        assert_eq!(config.audit.log_path, PathBuf::from("/var/log/requests.jsonl"));
        assert_eq!(config.drift.baseline_path, PathBuf::from("/srv/baseline.json"));
        assert_eq!(config.drift.threshold, 0.35);
        assert_eq!(config.drift.window, 250);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_live_log_fallback() {
        let config =
            Config::from_lookup(lookup_from(&[("LIVE_LOG", "/data/live.jsonl")])).unwrap();
        assert_eq!(config.audit.log_path, PathBuf::from("/data/live.jsonl"));

        let config = Config::from_lookup(lookup_from(&[
            ("LIVE_LOG", "/data/live.jsonl"),
            ("REQUEST_LOG", "/data/requests.jsonl"),
        ]))
        .unwrap();
        assert_eq!(config.audit.log_path, PathBuf::from("/data/requests.jsonl"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_lookup(lookup_from(&[("DRIFT_THRESHOLD", "high")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("DRIFT_THRESHOLD"));

        assert!(Config::from_lookup(lookup_from(&[("DRIFT_THRESHOLD", "-0.1")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DRIFT_THRESHOLD", "NaN")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DRIFT_WINDOW", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("AUDIT_QUEUE_CAPACITY", "0")])).is_err());
    }
}
