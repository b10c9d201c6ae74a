//! The offline drift job: baseline vs. the most recent audit records.

use crate::drift::{detect, DriftReport};
use ml_sentinel_core::{config::Config, events::FeatureMap, Error, Result};
use ml_sentinel_storage::{baseline::BaselineStore, reader::read_recent};
use std::{fmt, path::PathBuf};
use tracing::{info, instrument, warn};

/// What a single job run found
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// No baseline has been built yet
    NoBaseline(PathBuf),
    Report(DriftReport),
}

impl JobOutcome {
    /// The report, if a comparison was attempted
    pub fn report(&self) -> Option<&DriftReport> {
        match self {
            JobOutcome::NoBaseline(_) => None,
            JobOutcome::Report(report) => Some(report),
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::NoBaseline(path) => write!(
                f,
                "[drift] no baseline found at {}; create one by running 'sentinel baseline'",
                path.display()
            ),
            JobOutcome::Report(report) => fmt::Display::fmt(report, f),
        }
    }
}

/// Stateless single-pass drift check
#[derive(Debug, Clone)]
pub struct DriftJob {
    audit_log: PathBuf,
    store: BaselineStore,
    threshold: f64,
    window: usize,
}

impl DriftJob {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.drift.validate()?;
        Ok(Self {
            audit_log: config.audit.log_path.clone(),
            store: BaselineStore::new(config.drift.baseline_path.clone()),
            threshold: config.drift.threshold,
            window: config.drift.window,
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::config(format!(
                "drift threshold must be a non-negative number, got {threshold}"
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn with_window(mut self, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(Error::config("drift window must be at least 1"));
        }
        self.window = window;
        Ok(self)
    }

    /// Load the baseline and the live window, then compare them.
    ///
    /// A missing baseline is reported as an outcome rather than an error.
    #[instrument(skip(self), fields(window = self.window, threshold = self.threshold))]
    pub fn run(&self) -> Result<JobOutcome> {
        let baseline = match self.store.load() {
            Ok(baseline) => baseline,
            Err(Error::BaselineMissing(path)) => {
                warn!(path = %path.display(), "No baseline to compare against");
                return Ok(JobOutcome::NoBaseline(path));
            }
            Err(e) => return Err(e),
        };

        let live: Vec<FeatureMap> = read_recent(&self.audit_log, self.window)?
            .into_iter()
            .map(|record| record.into_features())
            .collect();
        info!(
            audit_log = %self.audit_log.display(),
            live_samples = live.len(),
            baseline_keys = baseline.len(),
            "Running drift check"
        );

        let report = detect(&baseline, &live, self.threshold);
        info!(
            status = report.status.as_str(),
            alerts = report.alerts.len(),
            "Drift check finished"
        );
        Ok(JobOutcome::Report(report))
    }
}
