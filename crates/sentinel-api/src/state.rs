//! Immutable serving context shared by every handler.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use ml_sentinel_core::{config::Config, Error, Result};
use ml_sentinel_inference::{
    artifacts::{load_artifacts, ArtifactFingerprints, LoadedArtifacts},
    engine::InferenceEngine,
    metrics::{InferenceMetrics, LATENCY_BUCKETS, LATENCY_SECONDS},
};
use ml_sentinel_storage::{
    file::JsonlFileSink,
    writer::{AuditLogWriter, AuditMetrics},
    AuditSink,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Everything a request needs, constructed once at startup.
///
/// The context owns its own Prometheus registry; nothing is installed as the
/// process-global recorder.
pub struct ServingContext {
    engine: InferenceEngine,
    audit: AuditLogWriter,
    metrics: PrometheusHandle,
    fingerprints: ArtifactFingerprints,
    version: String,
}

impl ServingContext {
    /// Load artifacts from the configured paths and start the file-backed
    /// audit writer. Must be called inside a Tokio runtime.
    pub fn from_config(
        config: &Config,
        version: impl Into<String>,
    ) -> Result<(Self, JoinHandle<()>)> {
        let artifacts = load_artifacts(&config.artifacts)?;
        let sink = Arc::new(JsonlFileSink::new(config.audit.log_path.clone()));
        info!(audit_log = %sink.path().display(), "Audit log configured");
        Self::build(artifacts, sink, config.audit.queue_capacity, version)
    }

    /// Assemble a context from loaded artifacts and an arbitrary audit sink.
    /// Must be called inside a Tokio runtime.
    pub fn build(
        artifacts: LoadedArtifacts,
        sink: Arc<dyn AuditSink>,
        queue_capacity: usize,
        version: impl Into<String>,
    ) -> Result<(Self, JoinHandle<()>)> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(LATENCY_SECONDS.to_string()), LATENCY_BUCKETS)
            .map_err(|e| Error::config(format!("invalid latency buckets: {e}")))?
            .build_recorder();
        let metrics = recorder.handle();

        let engine =
            InferenceEngine::from_artifacts(&artifacts, InferenceMetrics::register(&recorder))?;
        let (audit, task) =
            AuditLogWriter::spawn(sink, queue_capacity, AuditMetrics::register(&recorder))?;

        Ok((
            Self {
                engine,
                audit,
                metrics,
                fingerprints: artifacts.fingerprints,
                version: version.into(),
            },
            task,
        ))
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditLogWriter {
        &self.audit
    }

    pub fn fingerprints(&self) -> &ArtifactFingerprints {
        &self.fingerprints
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Prometheus text exposition of every series in this context
    pub fn render_metrics(&self) -> String {
        self.metrics.render()
    }
}

impl std::fmt::Debug for ServingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServingContext")
            .field("engine", &self.engine)
            .field("audit", &self.audit)
            .field("fingerprints", &self.fingerprints)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
