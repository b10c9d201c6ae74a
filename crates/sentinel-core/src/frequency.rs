//! Categorical frequency tables.
//!
//! A [`FrequencyTable`] maps each tracked feature key to the empirical
//! proportion of every stringified value observed for it. Tables are always
//! built wholesale from a finite sample and compared with the per-key
//! maximum absolute proportion difference.

use crate::events::{category_of, FeatureMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Value-string -> proportion for one feature key
pub type Distribution = BTreeMap<String, f64>;

/// Feature key -> distribution of its observed values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(BTreeMap<String, Distribution>);

impl FrequencyTable {
    /// Build a table over `keys` from `rows`.
    ///
    /// A key absent from a row counts as the `"missing"` value. With no rows
    /// every key maps to an empty distribution.
    pub fn from_rows<'a, I, K>(rows: I, keys: &[K]) -> Self
    where
        I: IntoIterator<Item = &'a FeatureMap>,
        K: AsRef<str>,
    {
        let mut counts: BTreeMap<&str, BTreeMap<String, u64>> = keys
            .iter()
            .map(|k| (k.as_ref(), BTreeMap::new()))
            .collect();
        let mut total: u64 = 0;

        for row in rows {
            total += 1;
            for (key, values) in counts.iter_mut() {
                *values.entry(category_of(row, key)).or_insert(0) += 1;
            }
        }

        let table = counts
            .into_iter()
            .map(|(key, values)| {
                let distribution = values
                    .into_iter()
                    .map(|(value, count)| (value, count as f64 / total as f64))
                    .collect();
                (key.to_string(), distribution)
            })
            .collect();

        Self(table)
    }

    /// Build a table from already computed distributions.
    pub fn from_distributions(table: BTreeMap<String, Distribution>) -> Self {
        Self(table)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Distribution> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Distribution)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Per-key maximum absolute proportion difference against `other`.
    ///
    /// Only keys of `self` are evaluated. Values seen on one side only
    /// contribute their full proportion; a key absent from `other` is
    /// compared against an empty distribution.
    pub fn max_abs_diff(&self, other: &FrequencyTable) -> BTreeMap<String, f64> {
        let empty = Distribution::new();
        self.0
            .iter()
            .map(|(key, ours)| {
                let theirs = other.0.get(key).unwrap_or(&empty);
                let values: BTreeSet<&String> = ours.keys().chain(theirs.keys()).collect();
                let discrepancy = values
                    .into_iter()
                    .map(|value| {
                        let p = ours.get(value).copied().unwrap_or(0.0);
                        let q = theirs.get(value).copied().unwrap_or(0.0);
                        (p - q).abs()
                    })
                    .fold(0.0_f64, f64::max);
                (key.clone(), discrepancy)
            })
            .collect()
    }
}
