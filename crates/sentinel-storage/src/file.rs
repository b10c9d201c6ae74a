//! Append-only JSONL audit file.

use crate::AuditSink;
use async_trait::async_trait;
use ml_sentinel_core::{events::PredictionRecord, Error, Result};
use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, warn};

/// Appends one JSON object per line to a file.
///
/// The file and its parent directory are created on first write. Each record
/// goes out in a single write so a line is never interleaved with another.
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::AuditWrite(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::AuditWrite(format!("cannot open {}: {e}", self.path.display())))?;

        if self.has_torn_tail().await? {
            // Terminate the fragment so the next record starts on its own line.
            file.write_all(b"\n")
                .await
                .map_err(|e| Error::AuditWrite(e.to_string()))?;
            warn!(path = %self.path.display(), "Terminated torn line in audit log");
        }

        debug!(path = %self.path.display(), "Opened audit log");
        Ok(file)
    }

    /// True when the file is non-empty and its last byte is not a newline.
    async fn has_torn_tail(&self) -> Result<bool> {
        let io_err = |e: std::io::Error| {
            Error::AuditWrite(format!("cannot inspect {}: {e}", self.path.display()))
        };

        let mut reader = File::open(&self.path).await.map_err(io_err)?;
        if reader.metadata().await.map_err(io_err)?.len() == 0 {
            return Ok(false);
        }
        reader.seek(SeekFrom::End(-1)).await.map_err(io_err)?;
        let mut last = [0u8; 1];
        reader.read_exact(&mut last).await.map_err(io_err)?;
        Ok(last[0] != b'\n')
    }
}

#[async_trait]
impl AuditSink for JsonlFileSink {
    async fn append(&self, record: &PredictionRecord) -> Result<()> {
        let line = record.to_json_line()?;

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        let Some(file) = guard.as_mut() else {
            return Err(Error::AuditWrite("audit log is not open".to_string()));
        };

        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            // Reopen on the next append in case the file was rotated away.
            *guard = None;
            warn!(path = %self.path.display(), error = %e, "Audit append failed");
            return Err(Error::AuditWrite(e.to_string()));
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        if let Some(file) = self.file.lock().await.as_mut() {
            file.sync_data()
                .await
                .map_err(|e| Error::AuditWrite(e.to_string()))?;
        }
        Ok(())
    }
}
