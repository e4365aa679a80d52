//! CSV rendering of session records.
//!
//! Hand-rolled RFC-4180-style output: fields containing a comma, quote,
//! or newline are quoted with embedded quotes doubled. Annotation
//! fields are newline-joined, so quoting is the common case, not the
//! exception.

use std::fmt::Write as _;

use crate::pipeline::annotate::AnnotationRecord;

pub const CSV_HEADER: &str = "image,key_value_pair,table,other_details";

/// Render all records as CSV, one row per record in processing order.
pub fn records_to_csv(records: &[AnnotationRecord]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for record in records {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            escape_csv(&record.image),
            escape_csv(&record.key_value_pair),
            escape_csv(&record.table),
            escape_csv(&record.other_details),
        );
    }

    out
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
