//! API request handlers.
//!
//! - `GET /` service information
//! - `GET /health` liveness
//! - `GET /metrics` Prometheus exposition
//! - `POST /predict` inference

pub mod health;
pub mod info;
pub mod metrics;
pub mod predict;

pub use health::*;
pub use info::*;
pub use metrics::*;
pub use predict::*;
