//! Inference endpoint.
//!
//! - POST /predict - score `{"features": {...}}` and return the positive-class
//!   probability

use crate::{state::ServingContext, ApiError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use ml_sentinel_core::events::{FeatureMap, PredictionRecord};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{debug, instrument};
use uuid::Uuid;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body for POST /predict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureMap,
}

/// Response body for POST /predict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub probability_over_50k: f64,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /predict
///
/// The body is parsed here rather than by the `Json` extractor so that
/// malformed and oversized bodies are still counted as failed inference
/// requests.
#[instrument(skip(ctx, body), fields(request_id = %Uuid::new_v4()))]
pub async fn predict(
    State(ctx): State<Arc<ServingContext>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let started = Instant::now();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            ctx.engine().metrics().observe(false, started.elapsed());
            let err = ApiError::new(rejection.status(), rejection.body_text());
            debug!(status = %err.status(), "Rejected request body");
            return Err(err);
        }
    };

    let request: PredictRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            ctx.engine().metrics().observe(false, started.elapsed());
            debug!(error = %e, "Rejected malformed request body");
            return Err(ApiError::bad_request(format!("invalid request body: {e}")));
        }
    };

    let probability = ctx.engine().predict(&request.features)?;

    let record = PredictionRecord::now(request.features, probability)?;
    ctx.audit().append(record);

    Ok(Json(PredictResponse {
        probability_over_50k: probability,
    }))
}
