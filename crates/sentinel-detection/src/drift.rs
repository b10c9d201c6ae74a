//! Categorical drift detection.
//!
//! Compares the baseline frequency table against a table built from recent
//! live feature maps over the same keys. The discrepancy for a key is the
//! maximum absolute difference in proportion across every value seen on
//! either side; a key alerts when its discrepancy reaches the threshold.

use ml_sentinel_core::{events::FeatureMap, frequency::FrequencyTable};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info, warn};

/// Overall outcome of one drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    /// The live window was empty; nothing was compared
    NoData,
    /// Every key stayed below the threshold
    NoDrift,
    /// At least one key reached the threshold
    DriftDetected,
}

impl DriftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftStatus::NoData => "no_data",
            DriftStatus::NoDrift => "no_drift",
            DriftStatus::DriftDetected => "drift_detected",
        }
    }
}

/// Result of comparing live traffic against the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub status: DriftStatus,
    pub threshold: f64,
    /// Number of live feature maps compared
    pub live_samples: usize,
    /// Discrepancy for every baseline key
    pub discrepancies: BTreeMap<String, f64>,
    /// Keys whose discrepancy is at least the threshold
    pub alerts: BTreeMap<String, f64>,
}

impl DriftReport {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Compare `live_rows` against `baseline`.
///
/// The baseline's keys define the tracked universe. An empty window yields
/// [`DriftStatus::NoData`] without any comparison.
pub fn detect(baseline: &FrequencyTable, live_rows: &[FeatureMap], threshold: f64) -> DriftReport {
    if live_rows.is_empty() {
        debug!("No live rows to compare");
        return DriftReport {
            status: DriftStatus::NoData,
            threshold,
            live_samples: 0,
            discrepancies: BTreeMap::new(),
            alerts: BTreeMap::new(),
        };
    }

    let keys: Vec<&str> = baseline.keys().collect();
    let live = FrequencyTable::from_rows(live_rows, &keys);
    let discrepancies = baseline.max_abs_diff(&live);

    let alerts: BTreeMap<String, f64> = discrepancies
        .iter()
        .filter(|(_, &d)| d >= threshold)
        .map(|(k, &d)| (k.clone(), d))
        .collect();

    let status = if alerts.is_empty() {
        info!(
            keys = keys.len(),
            live_samples = live_rows.len(),
            threshold,
            "No significant drift"
        );
        DriftStatus::NoDrift
    } else {
        warn!(
            alerts = ?alerts,
            live_samples = live_rows.len(),
            threshold,
            "Categorical drift detected"
        );
        DriftStatus::DriftDetected
    };

    DriftReport {
        status,
        threshold,
        live_samples: live_rows.len(),
        discrepancies,
        alerts,
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            DriftStatus::NoData => write!(f, "[drift] no live data to check"),
            DriftStatus::NoDrift => write!(f, "[drift] no significant drift detected"),
            DriftStatus::DriftDetected => {
                write!(f, "[ALERT][drift] categorical shift detected: {{")?;
                for (i, (key, discrepancy)) in self.alerts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {discrepancy:.4}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_sentinel_core::events::FeatureValue;

    fn baseline() -> FrequencyTable {
        FrequencyTable::from_distributions(BTreeMap::from([(
            "sex".to_string(),
            BTreeMap::from([("Male".to_string(), 0.6), ("Female".to_string(), 0.4)]),
        )]))
    }

    /// 19 Male rows and 1 Female row: proportions 0.95 / 0.05.
    fn skewed_live() -> Vec<FeatureMap> {
        (0..20)
            .map(|i| {
                let sex = if i == 0 { "Female" } else { "Male" };
                FeatureMap::from([
                    ("sex".to_string(), FeatureValue::from(sex)),
                    ("age".to_string(), FeatureValue::from(30 + i)),
                ])
            })
            .collect()
    }

    #[test]
    fn test_alert_at_default_threshold() {
        let report = detect(&baseline(), &skewed_live(), 0.2);
        assert_eq!(report.status, DriftStatus::DriftDetected);
        assert_eq!(report.live_samples, 20);
        assert_eq!(report.alerts.len(), 1);
        assert!((report.alerts["sex"] - 0.35).abs() < 1e-9);
        assert_eq!(
            report.to_string(),
            "[ALERT][drift] categorical shift detected: {sex: 0.3500}"
        );
    }

    #[test]
    fn test_no_alert_above_discrepancy() {
        let report = detect(&baseline(), &skewed_live(), 0.4);
        assert_eq!(report.status, DriftStatus::NoDrift);
        assert!(!report.has_alerts());
        assert!((report.discrepancies["sex"] - 0.35).abs() < 1e-9);
        assert_eq!(report.to_string(), "[drift] no significant drift detected");
    }

    #[test]
    fn test_empty_window_is_no_data() {
        let report = detect(&baseline(), &[], 0.2);
        assert_eq!(report.status, DriftStatus::NoData);
        assert!(report.alerts.is_empty());
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.to_string(), "[drift] no live data to check");
    }

    #[test]
    fn test_absent_key_counts_as_missing() {
        let rows: Vec<FeatureMap> = (0..4)
            .map(|i| FeatureMap::from([("age".to_string(), FeatureValue::from(i))]))
            .collect();
        let report = detect(&baseline(), &rows, 0.2);

        // Live is 100% "missing", which the baseline never saw.
        assert_eq!(report.discrepancies["sex"], 1.0);
        assert!(report.has_alerts());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let live: Vec<FeatureMap> = (0..10)
            .map(|i| {
                let sex = if i < 6 { "Male" } else { "Female" };
                FeatureMap::from([("sex".to_string(), FeatureValue::from(sex))])
            })
            .collect();
        let report = detect(&baseline(), &live, 0.0);
        assert_eq!(report.discrepancies["sex"], 0.0);
        assert_eq!(report.status, DriftStatus::DriftDetected);
    }

    #[test]
    fn test_report_json() {
        let report = detect(&baseline(), &skewed_live(), 0.2);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "drift_detected");
        assert_eq!(json["live_samples"], 20);
        assert!(json["alerts"]["sex"].is_number());
    }
}
