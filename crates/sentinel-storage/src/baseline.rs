//! Persisted baseline frequency table.

use ml_sentinel_core::{frequency::FrequencyTable, Error, Result};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::info;

/// Reads and writes the baseline JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the stored baseline.
    ///
    /// The table is written to a sibling temporary file and renamed into
    /// place, so a reader sees either the old baseline or the new one.
    pub fn save(&self, table: &FrequencyTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| Error::config(format!("invalid baseline path {}", self.path.display())))?;
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), keys = table.len(), "Baseline saved");
        Ok(())
    }

    /// Load the stored baseline, or [`Error::BaselineMissing`] if none exists.
    pub fn load(&self) -> Result<FrequencyTable> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::BaselineMissing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn table(male: f64) -> FrequencyTable {
        FrequencyTable::from_distributions(BTreeMap::from([(
            "sex".to_string(),
            BTreeMap::from([
                ("Female".to_string(), 1.0 - male),
                ("Male".to_string(), male),
            ]),
        )]))
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("artifacts/baseline_feature_freq.json"));
        assert!(!store.exists());

        store.save(&table(0.5)).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), table(0.5));

        store.save(&table(0.75)).unwrap();
        assert_eq!(store.load().unwrap(), table(0.75));

        let leftovers: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_missing_baseline() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));
        assert!(matches!(store.load(), Err(Error::BaselineMissing(_))));
    }

    #[test]
    fn test_corrupt_baseline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = BaselineStore::new(path);
        assert!(matches!(store.load(), Err(Error::Serialization(_))));
    }
}
