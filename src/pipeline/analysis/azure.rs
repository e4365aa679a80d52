//! Document Intelligence REST client.
//!
//! The analyze call is a two-step operation: submit the image, then
//! poll the returned operation URL until the service reports a terminal
//! status. The client is blocking (async callers bridge through
//! `spawn_blocking`); the poll loop is bounded by a configurable
//! deadline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use base64::Engine as _;

use super::types::{
    validate_endpoint, validate_model_id, AnalysisClient, AnalyzeOperationResponse,
    AnalyzeRequest, AnalyzeResult, MAX_IMAGE_BYTES,
};
use super::AnalysisError;
use crate::config::AppConfig;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

// ──────────────────────────────────────────────
// AzureDocumentClient
// ──────────────────────────────────────────────

/// Production analysis client for the Document Intelligence REST API.
pub struct AzureDocumentClient {
    endpoint: String,
    api_key: String,
    model_id: String,
    api_version: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl AzureDocumentClient {
    /// Create a client. Endpoint and model id are validated up front so
    /// a misconfiguration fails at startup, not on the first upload.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        model_id: &str,
        api_version: &str,
        timeout_secs: u64,
    ) -> Result<Self, AnalysisError> {
        validate_endpoint(endpoint)?;
        validate_model_id(model_id)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_id: model_id.to_string(),
            api_version: api_version.to_string(),
            client,
            timeout_secs,
            poll_interval: Duration::from_millis(1_000),
            poll_timeout: Duration::from_secs(120),
        })
    }

    /// Build a client from resolved application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        Ok(Self::new(
            &config.endpoint,
            &config.api_key,
            &config.model_id,
            &config.api_version,
            config.request_timeout_secs,
        )?
        .with_polling(config.poll_interval(), config.poll_timeout()))
    }

    /// Override the poll cadence and deadline.
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model_id, self.api_version
        )
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_connect() {
            AnalysisError::NotReachable
        } else if e.is_timeout() {
            AnalysisError::Timeout(self.timeout_secs)
        } else {
            AnalysisError::Network(e.to_string())
        }
    }

    /// Submit the image; returns the operation URL to poll.
    fn submit(&self, image_bytes: &[u8]) -> Result<String, AnalysisError> {
        let body = AnalyzeRequest {
            base64_source: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        };

        let response = self
            .client
            .post(self.analyze_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(AnalysisError::MissingOperationLocation)
    }

    /// Poll the operation URL until a terminal status or the deadline.
    fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, AnalysisError> {
        let deadline = Instant::now() + self.poll_timeout;

        loop {
            let response = self
                .client
                .get(operation_url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .send()
                .map_err(|e| self.map_transport_error(e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(AnalysisError::ApiError {
                    status: status.as_u16(),
                    body,
                });
            }

            let op: AnalyzeOperationResponse = response
                .json()
                .map_err(|e| AnalysisError::ResponseParsing(e.to_string()))?;

            match op.status.as_str() {
                "succeeded" => {
                    let result = op.analyze_result.ok_or_else(|| {
                        AnalysisError::ResponseParsing(
                            "operation succeeded without an analyzeResult".to_string(),
                        )
                    })?;
                    return Ok(result.into());
                }
                "failed" => {
                    let (code, message) = op
                        .error
                        .map(|e| (e.code, e.message))
                        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));
                    return Err(AnalysisError::AnalysisFailed { code, message });
                }
                "notStarted" | "running" => {}
                other => {
                    return Err(AnalysisError::ResponseParsing(format!(
                        "unexpected operation status '{other}'"
                    )));
                }
            }

            if Instant::now() >= deadline {
                return Err(AnalysisError::PollTimeout(self.poll_timeout.as_secs()));
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl AnalysisClient for AzureDocumentClient {
    fn analyze_document(&self, image_bytes: &[u8]) -> Result<AnalyzeResult, AnalysisError> {
        if image_bytes.len() > MAX_IMAGE_BYTES {
            return Err(AnalysisError::ImageTooLarge(image_bytes.len()));
        }

        let _span = tracing::info_span!(
            "analyze_document",
            model = %self.model_id,
            image_size = image_bytes.len(),
        )
        .entered();
        let start = Instant::now();

        let operation_url = self.submit(image_bytes)?;
        let result = self.poll(&operation_url)?;

        tracing::info!(
            model = %self.model_id,
            elapsed_ms = %start.elapsed().as_millis(),
            kv_pairs = result.key_value_pairs.len(),
            tables = result.tables.len(),
            paragraphs = result.paragraphs.len(),
            "Document analysis complete"
        );

        Ok(result)
    }
}

// ──────────────────────────────────────────────
// MockAnalysisClient (testing)
// ──────────────────────────────────────────────

/// Mock analysis client for tests — returns a configurable result or a
/// canned failure, and counts calls so tests can assert which uploads
/// actually reached the remote service.
pub struct MockAnalysisClient {
    result: AnalyzeResult,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockAnalysisClient {
    pub fn new(result: AnalyzeResult) -> Self {
        Self {
            result,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A client that fails every call with the given service message.
    pub fn failing(message: &str) -> Self {
        Self {
            result: AnalyzeResult::default(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `analyze_document` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisClient for MockAnalysisClient {
    fn analyze_document(&self, _image_bytes: &[u8]) -> Result<AnalyzeResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(AnalysisError::ApiError {
                status: 500,
                body: message.clone(),
            }),
            None => Ok(self.result.clone()),
        }
    }
}
