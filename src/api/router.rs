//! API router.
//!
//! Returns a composable `Router` mounting the upload page at `/` and
//! the JSON API under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::api::ui;

/// Request bodies above this size are rejected before the multipart
/// parser runs: ten 4 MB images plus form overhead.
const MAX_UPLOAD_BODY_BYTES: usize = 10 * 4 * 1024 * 1024 + 1024 * 1024;

/// Build the annotation API router.
pub fn annotation_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/api/health", get(endpoints::health::check))
        .route("/api/reports", axum::routing::post(endpoints::reports::upload))
        .route(
            "/api/records",
            get(endpoints::reports::list).delete(endpoints::reports::clear),
        )
        .route("/api/export/csv", get(endpoints::export::csv))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
