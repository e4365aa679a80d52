//! Remote document-analysis client.
//!
//! The service contract is small: raw image bytes in, a structured
//! `AnalyzeResult` (key-value pairs, tables, paragraphs) out. The
//! production implementation talks to the Document Intelligence REST
//! API; tests swap in `MockAnalysisClient` at the `AnalysisClient`
//! trait seam.

pub mod azure;
pub mod types;

pub use azure::{AzureDocumentClient, MockAnalysisClient};
pub use types::{
    AnalysisClient, AnalyzeResult, DocumentTable, KeyValuePair, Paragraph, TableCell,
};

/// Dedicated error type for document-analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Document analysis service is not reachable — check the configured endpoint")]
    NotReachable,

    #[error("Analysis service returned an error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Analysis service accepted the document but returned no operation location")]
    MissingOperationLocation,

    #[error("Analysis did not complete within {0} seconds")]
    PollTimeout(u64),

    #[error("Analysis operation failed ({code}): {message}")]
    AnalysisFailed { code: String, message: String },

    #[error("Could not parse the analysis response: {0}")]
    ResponseParsing(String),

    #[error("Invalid service endpoint URL: '{0}'")]
    InvalidEndpoint(String),

    #[error("Invalid model identifier: '{0}'")]
    InvalidModelId(String),

    #[error("Image too large ({0} bytes) — maximum is 4 MB")]
    ImageTooLarge(usize),

    #[error("Network error: {0}")]
    Network(String),
}
