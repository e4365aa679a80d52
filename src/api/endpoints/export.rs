//! CSV export endpoint.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::export::records_to_csv;

/// `GET /api/export/csv` — download all session records as CSV.
pub async fn csv(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let csv = {
        let store = ctx
            .store
            .lock()
            .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?;
        records_to_csv(store.records())
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"annotated_reports.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| ApiError::Internal(format!("Could not build CSV response: {e}")))
}
