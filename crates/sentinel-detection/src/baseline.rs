//! Baseline construction from training rows.

use ml_sentinel_core::{
    events::FeatureMap, frequency::FrequencyTable, schema::FeatureSchema, Error, Result,
};
use ml_sentinel_storage::baseline::BaselineStore;
use tracing::{info, instrument};

/// Frequency table over `keys` for the given rows.
///
/// Pure and independent of row order; identical inputs give bit-identical
/// tables.
pub fn build_baseline<'a, I, K>(rows: I, keys: &[K]) -> FrequencyTable
where
    I: IntoIterator<Item = &'a FeatureMap>,
    K: AsRef<str>,
{
    FrequencyTable::from_rows(rows, keys)
}

/// Builds a baseline over a fixed key set and persists it
#[derive(Debug, Clone)]
pub struct BaselineBuilder {
    keys: Vec<String>,
    store: BaselineStore,
}

impl BaselineBuilder {
    /// Track the default drift keys present in `schema`.
    pub fn for_schema(schema: &FeatureSchema, store: BaselineStore) -> Self {
        Self {
            keys: schema.drift_keys(),
            store,
        }
    }

    /// Track an explicit key list instead.
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Build from `rows` and replace the stored baseline with the result.
    #[instrument(skip(self, rows), fields(rows = rows.len(), keys = self.keys.len()))]
    pub fn build_and_save(&self, rows: &[FeatureMap]) -> Result<FrequencyTable> {
        if self.keys.is_empty() {
            return Err(Error::config("no baseline keys to track"));
        }
        if rows.is_empty() {
            return Err(Error::TrainingData("no training rows".to_string()));
        }

        let table = build_baseline(rows, &self.keys);
        self.store.save(&table)?;

        info!(path = %self.store.path().display(), "Baseline rebuilt");
        Ok(table)
    }
}
