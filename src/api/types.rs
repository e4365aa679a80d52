//! Shared types for the API layer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::pipeline::analysis::AnalysisClient;
use crate::pipeline::annotate::AnnotationRecord;
use crate::session::AnnotationStore;

/// Shared context for all API routes: the session store, the analysis
/// client behind its trait seam, and the fixed multi-file delay.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<Mutex<AnnotationStore>>,
    pub analyzer: Arc<dyn AnalysisClient + Send + Sync>,
    pub batch_delay: Duration,
}

impl ApiContext {
    pub fn new(analyzer: Arc<dyn AnalysisClient + Send + Sync>, batch_delay: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(AnnotationStore::new())),
            analyzer,
            batch_delay,
        }
    }
}

/// Per-file outcome reported by the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub image: String,
    /// `"annotated"` or `"duplicate"`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationRecord>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub results: Vec<UploadResult>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<AnnotationRecord>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}
