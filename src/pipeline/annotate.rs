//! Annotation partitioner — the post-processing core.
//!
//! Splits one analysis result into three disjoint buckets:
//! key-value pairs, table lines, and other paragraphs. Text that already
//! appears as a key, a value, or a table cell is subtracted from the
//! paragraph bucket by exact string equality after trimming; there is no
//! fuzzier tie-break than that.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::analysis::AnalyzeResult;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// Structured partition of one analyzed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// `"key: value"` strings; the set is ordered so joined output is
    /// deterministic.
    pub kv_pairs: BTreeSet<String>,
    /// Per-table `"Table N:"` header lines followed by
    /// `"row R, col C: text"` lines, in extraction order.
    pub table_lines: Vec<String>,
    /// Paragraphs that survived the dedup subtraction, in extraction
    /// order.
    pub other_details: Vec<String>,
}

/// One session record: an image name plus the three buckets flattened
/// to newline-joined strings. This is the row shape the CSV export and
/// the records endpoint expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub image: String,
    pub key_value_pair: String,
    pub table: String,
    pub other_details: String,
}

impl Annotation {
    /// Flatten into a session record for the named image.
    pub fn into_record(self, image: &str) -> AnnotationRecord {
        AnnotationRecord {
            image: image.to_string(),
            key_value_pair: self
                .kv_pairs
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
            table: self.table_lines.join("\n"),
            other_details: self.other_details.join("\n"),
        }
    }
}

// ──────────────────────────────────────────────
// Partitioning
// ──────────────────────────────────────────────

/// Partition an analysis result into the three annotation buckets.
pub fn annotate(result: &AnalyzeResult) -> Annotation {
    let mut kv_pairs = BTreeSet::new();
    let mut key_texts: HashSet<String> = HashSet::new();
    let mut value_texts: HashSet<String> = HashSet::new();

    for kv in &result.key_value_pairs {
        let (Some(key), Some(value)) = (&kv.key, &kv.value) else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        kv_pairs.insert(format!("{key}: {value}"));
        key_texts.insert(key.to_string());
        value_texts.insert(value.to_string());
    }

    let mut table_lines = Vec::new();
    for (ti, table) in result.tables.iter().enumerate() {
        table_lines.push(format!("Table {}:", ti + 1));
        for cell in &table.cells {
            table_lines.push(format!(
                "row {}, col {}: {}",
                cell.row_index,
                cell.column_index,
                cell.content.trim()
            ));
        }
    }

    // Cell texts are derived from the formatted lines: everything after
    // the first ": ". Header lines contain no ": " and drop out here.
    let cell_texts: HashSet<&str> = table_lines
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, rest)| rest))
        .collect();

    let mut other_details = Vec::new();
    for para in &result.paragraphs {
        let text = para.content.trim();
        if !text.is_empty()
            && !key_texts.contains(text)
            && !value_texts.contains(text)
            && !cell_texts.contains(text)
        {
            other_details.push(text.to_string());
        }
    }

    Annotation {
        kv_pairs,
        table_lines,
        other_details,
    }
}
