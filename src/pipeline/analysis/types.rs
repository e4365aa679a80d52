//! Analysis result types, the client trait seam, wire-format
//! deserialization structs, and input validators.

use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Images above this size are rejected before any HTTP call.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

// ──────────────────────────────────────────────
// Structured analysis result
// ──────────────────────────────────────────────

/// Structured result of one document analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub key_value_pairs: Vec<KeyValuePair>,
    pub tables: Vec<DocumentTable>,
    pub paragraphs: Vec<Paragraph>,
}

/// A label/value text pair detected in the document. Either side may be
/// absent when the service detects a label with no filled-in value (or,
/// rarely, the reverse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// A detected table with its cell grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTable {
    pub row_count: u32,
    pub column_count: u32,
    pub cells: Vec<TableCell>,
}

/// One cell of a detected table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub row_index: u32,
    pub column_index: u32,
    pub content: String,
}

/// A block of free-form text detected outside tables and key-value
/// regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub content: String,
}

// ──────────────────────────────────────────────
// Client trait seam
// ──────────────────────────────────────────────

/// Document-analysis client abstraction (allows mocking for tests).
pub trait AnalysisClient {
    /// Submit raw image bytes and block until the structured result is
    /// available (the production client submits, then polls).
    fn analyze_document(&self, image_bytes: &[u8]) -> Result<AnalyzeResult, AnalysisError>;
}

// ──────────────────────────────────────────────
// Validators
// ──────────────────────────────────────────────

/// Validate the service endpoint URL: http/https scheme and a non-empty
/// host. Anything else fails before the first HTTP call.
pub fn validate_endpoint(url: &str) -> Result<(), AnalysisError> {
    let after_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| AnalysisError::InvalidEndpoint(url.to_string()))?;

    let host = after_scheme
        .split('/')
        .next()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("");

    if host.is_empty() {
        return Err(AnalysisError::InvalidEndpoint(url.to_string()));
    }
    Ok(())
}

/// Validate a model identifier against the service naming convention
/// before it is interpolated into a request path: alphanumeric start,
/// then alphanumerics, dots, underscores, and hyphens.
pub fn validate_model_id(id: &str) -> Result<(), AnalysisError> {
    let valid = regex::Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").expect("static regex");
    if !valid.is_match(id) {
        return Err(AnalysisError::InvalidModelId(id.to_string()));
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Wire format (REST API request/response bodies)
// ──────────────────────────────────────────────

/// Request body for `documentModels/{modelId}:analyze` — the image
/// travels base64-encoded in JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeRequest {
    pub base64_source: String,
}

/// Response body of the operation-status poll.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeOperationResponse {
    pub status: String,
    #[serde(default)]
    pub analyze_result: Option<WireAnalyzeResult>,
    #[serde(default)]
    pub error: Option<WireServiceError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireServiceError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// `analyzeResult` payload. Every collection defaults to empty — the
/// service omits sections the document does not contain.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAnalyzeResult {
    #[serde(default)]
    pub key_value_pairs: Vec<WireKeyValuePair>,
    #[serde(default)]
    pub tables: Vec<WireTable>,
    #[serde(default)]
    pub paragraphs: Vec<WireParagraph>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireKeyValuePair {
    #[serde(default)]
    pub key: Option<WireElement>,
    #[serde(default)]
    pub value: Option<WireElement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireElement {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTable {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
    #[serde(default)]
    pub cells: Vec<WireCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCell {
    #[serde(default)]
    pub row_index: u32,
    #[serde(default)]
    pub column_index: u32,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireParagraph {
    #[serde(default)]
    pub content: String,
}

impl From<WireAnalyzeResult> for AnalyzeResult {
    fn from(wire: WireAnalyzeResult) -> Self {
        AnalyzeResult {
            key_value_pairs: wire
                .key_value_pairs
                .into_iter()
                .map(|kv| KeyValuePair {
                    key: kv.key.map(|e| e.content),
                    value: kv.value.map(|e| e.content),
                })
                .collect(),
            tables: wire
                .tables
                .into_iter()
                .map(|t| DocumentTable {
                    row_count: t.row_count,
                    column_count: t.column_count,
                    cells: t
                        .cells
                        .into_iter()
                        .map(|c| TableCell {
                            row_index: c.row_index,
                            column_index: c.column_index,
                            content: c.content,
                        })
                        .collect(),
                })
                .collect(),
            paragraphs: wire
                .paragraphs
                .into_iter()
                .map(|p| Paragraph { content: p.content })
                .collect(),
        }
    }
}
