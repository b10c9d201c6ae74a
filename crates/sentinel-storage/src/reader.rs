//! Windowed reads of the JSONL audit log.

use ml_sentinel_core::{events::PredictionRecord, Result};
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader, ErrorKind},
    path::Path,
};
use tracing::{debug, warn};

/// The last `window` well-formed records of the audit log, oldest first.
///
/// A missing log reads as empty. Lines that are blank, not valid JSON, not a
/// prediction record or out of range are skipped and do not count towards
/// the window.
pub fn read_recent(path: &Path, window: usize) -> Result<Vec<PredictionRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No audit log yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut recent = VecDeque::with_capacity(window.min(4096));
    let mut skipped = 0usize;

    for line in BufReader::new(file).split(b'\n') {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let record = match serde_json::from_slice::<PredictionRecord>(&line) {
            Ok(record) if record.validate().is_ok() => record,
            _ => {
                skipped += 1;
                continue;
            }
        };

        if window == 0 {
            continue;
        }
        if recent.len() == window {
            recent.pop_front();
        }
        recent.push_back(record);
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Skipped malformed audit log lines");
    }

    Ok(recent.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{file::JsonlFileSink, AuditSink};
    use ml_sentinel_core::events::{FeatureMap, FeatureValue};
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn line(ts: f64, sex: &str) -> String {
        let mut features = FeatureMap::new();
        features.insert("sex".to_string(), sex.into());
        PredictionRecord::new(ts, features, 0.3)
            .unwrap()
            .to_json_line()
            .unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_recent(&dir.path().join("nope.jsonl"), 10).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_keeps_most_recent_window() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..10 {
            file.write_all(line(i as f64, "Male").as_bytes()).unwrap();
        }
        file.flush().unwrap();

        let records = read_recent(file.path(), 3).unwrap();
        let stamps: Vec<f64> = records.iter().map(|r| r.timestamp()).collect();
        assert_eq!(stamps, vec![7.0, 8.0, 9.0]);

        assert_eq!(read_recent(file.path(), 100).unwrap().len(), 10);
    }

    #[test]
    fn test_skips_corrupt_lines() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(line(1.0, "Male").as_bytes()).unwrap();
        file.write_all(b"{not json\n").unwrap();
        file.write_all(b"\n").unwrap();
        file.write_all(b"{\"ts\": 2.0, \"features\": {}, \"prediction\": 1.5}\n").unwrap();
        file.write_all(b"\xff\xfe\n").unwrap();
        file.write_all(line(3.0, "Female").as_bytes()).unwrap();
        // Truncated final line from an interrupted write
        file.write_all(b"{\"ts\": 4.0, \"feat").unwrap();
        file.flush().unwrap();

        let records = read_recent(file.path(), 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].features()["sex"], FeatureValue::from("Female"));
    }

    #[test]
    fn test_accepts_legacy_timestamp_field() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"{\"timestamp\": 12.5, \"features\": {\"sex\": \"Male\"}, \"prediction\": 0.1}\n",
        )
        .unwrap();
        file.flush().unwrap();

        let records = read_recent(file.path(), 5).unwrap();
        assert_eq!(records[0].timestamp(), 12.5);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_floats_survive_file_sink(
            values in prop::collection::vec((0.0..=1.0f64, -1.0e9..1.0e9f64), 1..16),
        ) {
            let records: Vec<PredictionRecord> = values
                .iter()
                .enumerate()
                .map(|(i, &(prediction, hours))| {
                    let mut features = FeatureMap::new();
                    features.insert("hours_per_week".to_string(), hours.into());
                    PredictionRecord::new(i as f64 + 0.1, features, prediction).unwrap()
                })
                .collect();

            let dir = TempDir::new().unwrap();
            let path = dir.path().join("audit.jsonl");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let sink = JsonlFileSink::new(&path);
                for record in &records {
                    sink.append(record).await.unwrap();
                }
                sink.flush().await.unwrap();
            });

            let read = read_recent(&path, records.len()).unwrap();
            prop_assert_eq!(read, records);
        }
    }
}
