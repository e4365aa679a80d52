//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
    pub version: &'static str,
}

/// `GET /api/health` — liveness check with session size.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let records = ctx
        .store
        .lock()
        .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?
        .len();

    Ok(Json(HealthResponse {
        status: "ok",
        records,
        version: crate::config::APP_VERSION,
    }))
}
