//! Non-blocking audit log writer.
//!
//! Request handlers hand records to a bounded queue drained by a single
//! consumer task, which is the only writer of the underlying [`AuditSink`].
//! When the queue is full the newest record is dropped, a warning is logged
//! and `audit_records_dropped_total` is incremented; the request itself is
//! never delayed or failed by auditing.

use crate::AuditSink;
use ::metrics::{Counter, Key, Level, Metadata, Recorder, Unit};
use ml_sentinel_core::{events::PredictionRecord, Error, Result};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Records that never reached the sink because the queue was full or closed
pub const RECORDS_DROPPED_TOTAL: &str = "audit_records_dropped_total";

/// Records the sink failed to write
pub const WRITE_FAILURES_TOTAL: &str = "audit_write_failures_total";

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Counter handles for the audit path
#[derive(Clone)]
pub struct AuditMetrics {
    dropped: Counter,
    failures: Counter,
}

impl AuditMetrics {
    /// Describe and register the audit series on `recorder`.
    pub fn register<R: Recorder + ?Sized>(recorder: &R) -> Self {
        recorder.describe_counter(
            RECORDS_DROPPED_TOTAL.into(),
            Some(Unit::Count),
            "Audit records dropped before reaching the log".into(),
        );
        recorder.describe_counter(
            WRITE_FAILURES_TOTAL.into(),
            Some(Unit::Count),
            "Audit records the log failed to persist".into(),
        );

        Self {
            dropped: recorder
                .register_counter(&Key::from_static_name(RECORDS_DROPPED_TOTAL), &METADATA),
            failures: recorder
                .register_counter(&Key::from_static_name(WRITE_FAILURES_TOTAL), &METADATA),
        }
    }

    pub fn noop() -> Self {
        Self {
            dropped: Counter::noop(),
            failures: Counter::noop(),
        }
    }
}

impl std::fmt::Debug for AuditMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditMetrics").finish_non_exhaustive()
    }
}

enum AuditCommand {
    Append(Box<PredictionRecord>),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle to the audit queue
#[derive(Clone)]
pub struct AuditLogWriter {
    tx: mpsc::Sender<AuditCommand>,
    metrics: AuditMetrics,
}

impl AuditLogWriter {
    /// Start the consumer task on the current runtime.
    ///
    /// The task exits, after flushing the sink, once every handle is dropped.
    pub fn spawn(
        sink: Arc<dyn AuditSink>,
        capacity: usize,
        metrics: AuditMetrics,
    ) -> Result<(Self, JoinHandle<()>)> {
        if capacity == 0 {
            return Err(Error::config("audit queue capacity must be at least 1"));
        }

        let (tx, rx) = mpsc::channel(capacity);
        let task = tokio::spawn(consume(sink, rx, metrics.failures.clone()));
        info!(capacity, "Audit writer started");

        Ok((Self { tx, metrics }, task))
    }

    /// Enqueue a record without waiting. Returns whether it was accepted.
    pub fn append(&self, record: PredictionRecord) -> bool {
        match self.tx.try_send(AuditCommand::Append(Box::new(record))) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.dropped.increment(1);
                warn!("Audit queue full, dropping record");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.dropped.increment(1);
                warn!("Audit writer stopped, dropping record");
                false
            }
        }
    }

    /// Wait until every record enqueued before this call has been handed to
    /// the sink and the sink has been flushed.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(AuditCommand::Flush(ack))
            .await
            .map_err(|_| Error::AuditWrite("audit writer stopped".to_string()))?;
        done.await
            .map_err(|_| Error::AuditWrite("audit writer stopped".to_string()))
    }
}

impl std::fmt::Debug for AuditLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogWriter")
            .field("capacity", &self.tx.max_capacity())
            .finish_non_exhaustive()
    }
}

async fn consume(
    sink: Arc<dyn AuditSink>,
    mut rx: mpsc::Receiver<AuditCommand>,
    failures: Counter,
) {
    while let Some(command) = rx.recv().await {
        match command {
            AuditCommand::Append(record) => {
                if let Err(e) = sink.append(&record).await {
                    failures.increment(1);
                    warn!(error = %e, "Failed to write audit record");
                }
            }
            AuditCommand::Flush(ack) => {
                if let Err(e) = sink.flush().await {
                    warn!(error = %e, "Failed to flush audit log");
                }
                let _ = ack.send(());
            }
        }
    }

    if let Err(e) = sink.flush().await {
        warn!(error = %e, "Failed to flush audit log on shutdown");
    }
    debug!("Audit writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{file::JsonlFileSink, reader::read_recent, MemorySink};
    use async_trait::async_trait;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use ml_sentinel_core::events::FeatureMap;
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(i: i64) -> PredictionRecord {
        let mut features = FeatureMap::new();
        features.insert("age".to_string(), i.into());
        PredictionRecord::new(i as f64, features, 0.5).unwrap()
    }

    /// Sink that blocks every append until released.
    #[derive(Debug)]
    struct GatedSink {
        gate: tokio::sync::Semaphore,
        inner: MemorySink,
    }

    #[async_trait]
    impl AuditSink for GatedSink {
        async fn append(&self, record: &PredictionRecord) -> Result<()> {
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();
            self.inner.append(record).await
        }

        async fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _record: &PredictionRecord) -> Result<()> {
            Err(Error::AuditWrite("disk full".to_string()))
        }

        async fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_records_reach_sink_in_order() {
        let sink = Arc::new(MemorySink::new());
        let (writer, _task) = AuditLogWriter::spawn(sink.clone(), 16, AuditMetrics::noop()).unwrap();

        for i in 0..10 {
            assert!(writer.append(record(i)));
        }
        writer.flush().await.unwrap();

        let stored = sink.records().await;
        assert_eq!(stored.len(), 10);
        assert!(stored.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let sink = Arc::new(GatedSink {
            gate: tokio::sync::Semaphore::new(0),
            inner: MemorySink::new(),
        });
        let (writer, _task) =
            AuditLogWriter::spawn(sink.clone(), 2, AuditMetrics::register(&recorder)).unwrap();

        // The consumer takes the first record and blocks on the gate.
        assert!(writer.append(record(0)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(writer.append(record(1)));
        assert!(writer.append(record(2)));
        assert!(!writer.append(record(3)));

        sink.gate.add_permits(3);
        writer.flush().await.unwrap();

        let stored = sink.inner.records().await;
        let stamps: Vec<f64> = stored.iter().map(|r| r.timestamp()).collect();
        assert_eq!(stamps, vec![0.0, 1.0, 2.0]);
        assert!(handle.render().contains("audit_records_dropped_total 1"));
    }

    #[tokio::test]
    async fn test_sink_failures_are_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let (writer, _task) =
            AuditLogWriter::spawn(Arc::new(FailingSink), 8, AuditMetrics::register(&recorder))
                .unwrap();

        assert!(writer.append(record(1)));
        assert!(writer.append(record(2)));
        writer.flush().await.unwrap();

        assert!(handle.render().contains("audit_write_failures_total 2"));
    }

    #[tokio::test]
    async fn test_task_exits_when_handles_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = Arc::new(JsonlFileSink::new(&path));
        let (writer, task) = AuditLogWriter::spawn(sink, 4, AuditMetrics::noop()).unwrap();

        let clone = writer.clone();
        assert!(clone.append(record(7)));
        drop(clone);
        drop(writer);
        task.await.unwrap();

        let stored = read_recent(&path, 10).unwrap();
        assert_eq!(stored, vec![record(7)]);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejected() {
        let sink = Arc::new(MemorySink::new());
        assert!(AuditLogWriter::spawn(sink, 0, AuditMetrics::noop()).is_err());
    }
}
