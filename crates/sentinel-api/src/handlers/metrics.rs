//! Prometheus exposition endpoint.

use crate::state::ServingContext;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

/// Content type of the Prometheus text format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// GET /metrics
pub async fn metrics_handler(State(ctx): State<Arc<ServingContext>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        ctx.render_metrics(),
    )
}
