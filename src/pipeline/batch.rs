//! Sequential batch runner for multi-image uploads.
//!
//! One remote call at a time, with a fixed delay between consecutive
//! calls to stay under the external rate limit. Duplicate filenames are
//! skipped (no remote call, no delay); the first remote failure aborts
//! the batch and propagates.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::analysis::{AnalysisClient, AnalysisError};
use super::annotate::{annotate, AnnotationRecord};
use crate::session::AnnotationStore;

/// One image queued for analysis.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub image: String,
    pub bytes: Vec<u8>,
}

/// Outcome for one image in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Analyzed and recorded in the session store.
    Annotated(AnnotationRecord),
    /// Filename already processed this session; skipped with a warning.
    Duplicate,
}

/// Errors from a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Session store lock was poisoned")]
    StorePoisoned,

    #[error("Analysis task did not complete: {0}")]
    TaskJoin(String),
}

/// Process a batch of images sequentially.
///
/// Returns per-image outcomes in input order. The fixed `delay` is
/// slept between consecutive remote calls only — never before the
/// first, never after the last, and never around a duplicate skip.
pub async fn run_batch(
    client: Arc<dyn AnalysisClient + Send + Sync>,
    store: Arc<Mutex<AnnotationStore>>,
    items: Vec<BatchItem>,
    delay: Duration,
) -> Result<Vec<(String, ItemOutcome)>, BatchError> {
    let mut outcomes = Vec::with_capacity(items.len());
    let mut called_remote = false;

    for item in items {
        let already = store
            .lock()
            .map_err(|_| BatchError::StorePoisoned)?
            .is_processed(&item.image);
        if already {
            tracing::warn!(image = %item.image, "Image already annotated this session, skipping");
            outcomes.push((item.image, ItemOutcome::Duplicate));
            continue;
        }

        if called_remote && !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Rate-limit delay before next analysis");
            tokio::time::sleep(delay).await;
        }

        let task_client = Arc::clone(&client);
        let bytes = item.bytes;
        let result = tokio::task::spawn_blocking(move || task_client.analyze_document(&bytes))
            .await
            .map_err(|e| BatchError::TaskJoin(e.to_string()))??;
        called_remote = true;

        let record = annotate(&result).into_record(&item.image);
        store
            .lock()
            .map_err(|_| BatchError::StorePoisoned)?
            .insert(record.clone());

        tracing::info!(
            image = %record.image,
            kv_pairs = result.key_value_pairs.len(),
            tables = result.tables.len(),
            other_details = record.other_details.lines().count(),
            "Image annotated"
        );
        outcomes.push((record.image.clone(), ItemOutcome::Annotated(record)));
    }

    Ok(outcomes)
}
