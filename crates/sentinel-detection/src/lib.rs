//! # Sentinel Detection
//!
//! Offline monitoring for the model sentinel.
//!
//! This crate provides:
//! - Baseline frequency tables built from training rows
//! - Max-abs-diff categorical drift detection against live traffic
//! - The single-pass drift job over the audit log

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod baseline;
pub mod drift;
pub mod job;
pub mod training;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::baseline::{build_baseline, BaselineBuilder};
    pub use crate::drift::{detect, DriftReport, DriftStatus};
    pub use crate::job::{DriftJob, JobOutcome};
    pub use crate::training::{load_training_rows, sample_rows};
}
