//! In-memory session store for annotation records.
//!
//! Holds the records produced this service session, in processing
//! order, plus the set of filenames already seen. Nothing is persisted;
//! a restart is a fresh session.

use std::collections::HashSet;

use crate::pipeline::annotate::AnnotationRecord;

/// Session collection: push-ordered records plus the processed-filename
/// set used for the duplicate-upload check.
pub struct AnnotationStore {
    records: Vec<AnnotationRecord>,
    processed: HashSet<String>,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            processed: HashSet::new(),
        }
    }

    /// Whether an image filename has already been annotated this session.
    pub fn is_processed(&self, image: &str) -> bool {
        self.processed.contains(image)
    }

    /// Append a record. Returns false (and stores nothing) if the image
    /// was already processed — duplicates are skipped, not replaced.
    pub fn insert(&mut self, record: AnnotationRecord) -> bool {
        if self.processed.contains(&record.image) {
            return false;
        }
        self.processed.insert(record.image.clone());
        self.records.push(record);
        true
    }

    /// All records in processing order.
    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the session has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records and processed filenames. Returns how many
    /// records were discarded.
    pub fn clear(&mut self) -> usize {
        let cleared = self.records.len();
        self.records.clear();
        self.processed.clear();
        cleared
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
