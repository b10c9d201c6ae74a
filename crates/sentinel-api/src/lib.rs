//! # Sentinel API
//!
//! HTTP serving path for the model sentinel.
//!
//! Endpoints:
//! - `GET /` service information and artifact fingerprints
//! - `GET /health` liveness
//! - `GET /metrics` Prometheus exposition
//! - `POST /predict` score a feature map

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use ml_sentinel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use state::ServingContext;
use std::{future::Future, net::SocketAddr, sync::Arc};
use tracing::{error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
    /// Metrics endpoint path
    pub metrics_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            timeout_secs: 30,
            max_body_size: 1024 * 1024,
            enable_logging: true,
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// Error body returned for every non-2xx response produced by a handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Handler error, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            error!(error = %err, "Request failed");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: err.to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

/// HTTP server bound to one serving context
#[derive(Debug)]
pub struct ApiServer {
    config: ApiConfig,
    context: Arc<ServingContext>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, context: Arc<ServingContext>) -> Self {
        Self { config, context }
    }

    pub fn router(&self) -> Router {
        routes::create_router(&self.config, self.context.clone())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::routes::create_router;
    pub use crate::state::ServingContext;
    pub use crate::{ApiConfig, ApiError, ApiServer, ErrorResponse};
}
