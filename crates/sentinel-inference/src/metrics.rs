//! Inference counters and latency histogram.
//!
//! Handles are registered against an explicit [`Recorder`] rather than the
//! process-global one, so every serving context (and every test) owns its own
//! set of series.

use ::metrics::{Counter, Histogram, Key, Level, Metadata, Recorder, Unit};
use std::time::Duration;

/// Every inbound prediction request
pub const REQUESTS_TOTAL: &str = "inference_requests_total";

/// Prediction requests that did not produce a probability
pub const ERRORS_TOTAL: &str = "inference_errors_total";

/// Time spent serving one prediction request
pub const LATENCY_SECONDS: &str = "inference_latency_seconds";

/// Histogram buckets for [`LATENCY_SECONDS`], in seconds
pub const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Handles for the inference series
#[derive(Clone)]
pub struct InferenceMetrics {
    requests: Counter,
    errors: Counter,
    latency: Histogram,
}

impl InferenceMetrics {
    /// Describe and register the inference series on `recorder`.
    pub fn register<R: Recorder + ?Sized>(recorder: &R) -> Self {
        recorder.describe_counter(
            REQUESTS_TOTAL.into(),
            Some(Unit::Count),
            "Prediction requests received".into(),
        );
        recorder.describe_counter(
            ERRORS_TOTAL.into(),
            Some(Unit::Count),
            "Prediction requests that failed".into(),
        );
        recorder.describe_histogram(
            LATENCY_SECONDS.into(),
            Some(Unit::Seconds),
            "Prediction request latency".into(),
        );

        Self {
            requests: recorder.register_counter(&Key::from_static_name(REQUESTS_TOTAL), &METADATA),
            errors: recorder.register_counter(&Key::from_static_name(ERRORS_TOTAL), &METADATA),
            latency: recorder
                .register_histogram(&Key::from_static_name(LATENCY_SECONDS), &METADATA),
        }
    }

    /// Handles that discard every observation
    pub fn noop() -> Self {
        Self {
            requests: Counter::noop(),
            errors: Counter::noop(),
            latency: Histogram::noop(),
        }
    }

    /// Record one finished request.
    pub fn observe(&self, success: bool, elapsed: Duration) {
        self.requests.increment(1);
        if !success {
            self.errors.increment(1);
        }
        self.latency.record(elapsed.as_secs_f64());
    }
}

impl std::fmt::Debug for InferenceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_observe_counts() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let metrics = InferenceMetrics::register(&recorder);

        metrics.observe(true, Duration::from_millis(2));
        metrics.observe(true, Duration::from_millis(3));
        metrics.observe(false, Duration::from_millis(1));

        let rendered = handle.render();
        assert!(rendered.contains("inference_requests_total 3"));
        assert!(rendered.contains("inference_errors_total 1"));
        assert!(rendered.contains("inference_latency_seconds"));
    }

    #[test]
    fn test_noop_accepts_observations() {
        InferenceMetrics::noop().observe(false, Duration::ZERO);
    }
}
