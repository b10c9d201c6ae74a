//! Static service information.

use crate::state::ServingContext;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Informational payload served at the root path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub model_sha256: String,
    pub encoder_sha256: String,
}

/// GET /
pub async fn root(State(ctx): State<Arc<ServingContext>>) -> Json<InfoResponse> {
    let fingerprints = ctx.fingerprints();
    Json(InfoResponse {
        message: "Model sentinel inference API. POST a feature map to /predict.".to_string(),
        version: ctx.version().to_string(),
        model_sha256: fingerprints.model_sha256.clone(),
        encoder_sha256: fingerprints.encoder_sha256.clone(),
    })
}
