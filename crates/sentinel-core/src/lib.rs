//! # Sentinel Core
//!
//! Shared building blocks for the model sentinel workspace:
//! - Error type and `Result` alias used by every library crate
//! - Environment-driven configuration
//! - Request and audit event types (`FeatureMap`, `PredictionRecord`)
//! - The explicit feature schema shared by serving and baseline construction
//! - Categorical frequency tables and their comparison

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod config;
pub mod error;
pub mod events;
pub mod frequency;
pub mod schema;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ArtifactConfig, AuditConfig, Config, DriftConfig, ServerConfig};
    pub use crate::error::{Error, Result};
    pub use crate::events::{FeatureMap, FeatureValue, PredictionRecord};
    pub use crate::frequency::FrequencyTable;
    pub use crate::schema::{FeatureKind, FeatureSchema, FeatureSpec};
}
