//! Report upload and session record endpoints.
//!
//! `POST /api/reports` accepts one or more report images as multipart
//! form data, runs each through the analysis pipeline, and records the
//! annotations in the session store. Duplicate filenames are reported
//! per file, not failed.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClearResponse, RecordsResponse, UploadResponse, UploadResult};
use crate::pipeline::analysis::types::MAX_IMAGE_BYTES;
use crate::pipeline::batch::{run_batch, BatchItem, ItemOutcome};

/// Maximum image files per upload request.
const MAX_FILES: usize = 10;

/// `POST /api/reports` — upload report images for annotation.
///
/// Each multipart field carrying a filename is treated as one image.
/// Files are validated (PNG/JPEG magic bytes, size cap) before any
/// remote call; the batch runner then processes them sequentially with
/// the configured inter-request delay.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut items: Vec<BatchItem> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            // Non-file form fields are ignored.
            continue;
        };
        if file_name.trim().is_empty() {
            return Err(ApiError::BadRequest("Uploaded file has no name".into()));
        }
        if items.len() >= MAX_FILES {
            return Err(ApiError::BadRequest(format!(
                "Maximum {MAX_FILES} files per upload"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read '{file_name}': {e}")))?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::PayloadTooLarge(format!(
                "'{file_name}' exceeds the 4 MB image limit ({} bytes)",
                bytes.len()
            )));
        }
        if detect_image_format(&bytes).is_none() {
            return Err(ApiError::UnsupportedMedia(format!(
                "'{file_name}' is not a PNG or JPEG image"
            )));
        }

        items.push(BatchItem {
            image: file_name,
            bytes: bytes.to_vec(),
        });
    }

    if items.is_empty() {
        return Err(ApiError::BadRequest("No image files in upload".into()));
    }

    tracing::info!(files = items.len(), "Report upload received");

    let outcomes = run_batch(
        ctx.analyzer.clone(),
        ctx.store.clone(),
        items,
        ctx.batch_delay,
    )
    .await?;

    let results = outcomes
        .into_iter()
        .map(|(image, outcome)| match outcome {
            ItemOutcome::Annotated(record) => UploadResult {
                image,
                status: "annotated",
                message: None,
                annotation: Some(record),
            },
            ItemOutcome::Duplicate => UploadResult {
                image,
                status: "duplicate",
                message: Some(
                    "This image has already been annotated in this session.".to_string(),
                ),
                annotation: None,
            },
        })
        .collect();

    Ok(Json(UploadResponse { results }))
}

/// `GET /api/records` — all session records in processing order.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<RecordsResponse>, ApiError> {
    let store = ctx
        .store
        .lock()
        .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?;
    let records = store.records().to_vec();
    Ok(Json(RecordsResponse {
        count: records.len(),
        records,
    }))
}

/// `DELETE /api/records` — start a fresh session.
pub async fn clear(State(ctx): State<ApiContext>) -> Result<Json<ClearResponse>, ApiError> {
    let cleared = ctx
        .store
        .lock()
        .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?
        .clear();
    tracing::info!(cleared, "Session records cleared");
    Ok(Json(ClearResponse { cleared }))
}

/// Detect the image format from magic bytes. Only the two formats the
/// annotation flow accepts are recognized.
fn detect_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some("jpg")
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        Some("png")
    } else {
        None
    }
}
