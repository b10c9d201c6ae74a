//! # Sentinel Storage
//!
//! Persistence layer for the model sentinel.
//!
//! This crate provides:
//! - Audit sinks for served predictions (JSONL file, in-memory)
//! - The bounded, non-blocking audit log writer used by request handlers
//! - Windowed reads of the audit log for the drift job
//! - The baseline frequency table store

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod baseline;
pub mod file;
pub mod reader;
pub mod writer;

use async_trait::async_trait;
use ml_sentinel_core::{events::PredictionRecord, Result};
use tokio::sync::Mutex;

/// Trait for audit log backends
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Append one record. A record is either fully written or not at all.
    async fn append(&self, record: &PredictionRecord) -> Result<()>;

    /// Make every appended record durable
    async fn flush(&self) -> Result<()>;
}

/// In-memory sink, used by tests and API-only deployments
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<PredictionRecord>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far
    pub async fn records(&self) -> Vec<PredictionRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, record: &PredictionRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::baseline::BaselineStore;
    pub use crate::file::JsonlFileSink;
    pub use crate::reader::read_recent;
    pub use crate::writer::{AuditLogWriter, AuditMetrics};
    pub use crate::{AuditSink, MemorySink};
}
