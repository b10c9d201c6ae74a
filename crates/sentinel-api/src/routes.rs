//! API route definitions.
//!
//! - `/` service information
//! - `/health` liveness
//! - `/metrics` (configurable path) Prometheus metrics
//! - `/predict` inference

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::timeout::TimeoutLayer;

use crate::{
    handlers::{health, metrics_handler, predict, root},
    middleware::{cors_middleware, logging_middleware},
    state::ServingContext,
    ApiConfig,
};

/// Create the API router around one serving context
pub fn create_router(config: &ApiConfig, context: Arc<ServingContext>) -> Router {
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(&config.metrics_path, get(metrics_handler))
        .route("/predict", post(predict))
        .with_state(context);

    let app = if config.enable_logging {
        app.layer(middleware::from_fn(logging_middleware))
    } else {
        app
    };

    let app = if config.enable_cors {
        app.layer(cors_middleware(config.cors_origins.clone()))
    } else {
        app
    };

    app.layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
}
