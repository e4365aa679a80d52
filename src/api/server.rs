//! HTTP server lifecycle — bind, spawn, graceful shutdown.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. The handle's `shutdown()` is idempotent.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::api::router::annotation_router;
use crate::api::types::ApiContext;

/// Metadata for a running annotation server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running annotation server.
pub struct AnnotationServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AnnotationServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Annotation server shutdown signal sent");
        }
    }
}

/// Start the annotation server on the given address.
///
/// Binds the listener, builds the router, and spawns the axum server in
/// a background tokio task. Returns a handle with session metadata and
/// the shutdown channel.
pub async fn start_server(
    ctx: ApiContext,
    addr: SocketAddr,
) -> Result<AnnotationServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind annotation server on {addr}: {e}"))?;

    let bound = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%bound, "Annotation server binding");

    let app = annotation_router(ctx);

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: bound.to_string(),
        port: bound.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Annotation server received shutdown signal");
        };

        tracing::info!(%bound, "Annotation server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Annotation server error: {e}");
        }

        tracing::info!("Annotation server stopped");
    });

    Ok(AnnotationServer {
        session,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::pipeline::analysis::{
        AnalyzeResult, DocumentTable, KeyValuePair, MockAnalysisClient, Paragraph, TableCell,
    };

    fn sample_result() -> AnalyzeResult {
        AnalyzeResult {
            key_value_pairs: vec![
                KeyValuePair {
                    key: Some("Patient Name".into()),
                    value: Some("Jane Doe".into()),
                },
                KeyValuePair {
                    key: Some("Ward".into()),
                    value: Some("B2".into()),
                },
            ],
            tables: vec![DocumentTable {
                row_count: 1,
                column_count: 2,
                cells: vec![
                    TableCell {
                        row_index: 0,
                        column_index: 0,
                        content: "WBC".into(),
                    },
                    TableCell {
                        row_index: 0,
                        column_index: 1,
                        content: "7.2".into(),
                    },
                ],
            }],
            paragraphs: vec![
                Paragraph {
                    content: "General Hospital".into(),
                },
                Paragraph {
                    content: "Jane Doe".into(),
                },
            ],
        }
    }

    fn test_ctx(client: MockAnalysisClient) -> ApiContext {
        ApiContext::new(Arc::new(client), Duration::ZERO)
    }

    async fn start_test_server(ctx: ApiContext) -> AnnotationServer {
        start_server(ctx, "127.0.0.1:0".parse().unwrap())
            .await
            .expect("server should start")
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    fn image_form(name: &str) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(png_bytes()).file_name(name.to_string());
        reqwest::multipart::Form::new().part("file", part)
    }

    #[tokio::test]
    async fn health_reports_ok_and_session_size() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let url = format!("http://127.0.0.1:{}/api/health", server.session.port);

        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["records"], 0);

        server.shutdown();
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let url = format!("http://127.0.0.1:{}/nonexistent", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        server.shutdown();
    }

    #[tokio::test]
    async fn index_serves_upload_page() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let url = format!("http://127.0.0.1:{}/", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body = resp.text().await.unwrap();
        assert!(body.contains("Medical Report Annotation"));
        server.shutdown();
    }

    #[tokio::test]
    async fn upload_annotates_and_partitions() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(image_form("report.png"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.unwrap();
        let result = &json["results"][0];
        assert_eq!(result["status"], "annotated");
        assert_eq!(result["image"], "report.png");

        let annotation = &result["annotation"];
        assert_eq!(
            annotation["key_value_pair"],
            "Patient Name: Jane Doe\nWard: B2"
        );
        assert_eq!(
            annotation["table"],
            "Table 1:\nrow 0, col 0: WBC\nrow 0, col 1: 7.2"
        );
        // "Jane Doe" is a value text, so only the hospital line survives.
        assert_eq!(annotation["other_details"], "General Hospital");

        server.shutdown();
    }

    #[tokio::test]
    async fn reupload_same_filename_is_reported_duplicate() {
        let ctx = test_ctx(MockAnalysisClient::new(sample_result()));
        let mut server = start_test_server(ctx).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        for expected in ["annotated", "duplicate"] {
            let resp = client
                .post(format!("{base}/api/reports"))
                .multipart(image_form("report.png"))
                .send()
                .await
                .unwrap();
            let json: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(json["results"][0]["status"], expected);
        }

        // Still exactly one record.
        let records: serde_json::Value = reqwest::get(format!("{base}/api/records"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(records["count"], 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn multi_file_upload_keeps_processing_order() {
        let ctx = test_ctx(MockAnalysisClient::new(sample_result()));
        let mut server = start_test_server(ctx).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(png_bytes()).file_name("first.png"),
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(png_bytes()).file_name("second.png"),
            );
        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let records: serde_json::Value = reqwest::get(format!("{base}/api/records"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(records["count"], 2);
        assert_eq!(records["records"][0]["image"], "first.png");
        assert_eq!(records["records"][1]["image"], "second.png");

        server.shutdown();
    }

    #[tokio::test]
    async fn non_image_upload_returns_415() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        let part = reqwest::multipart::Part::bytes(b"%PDF-1.4".to_vec()).file_name("report.pdf");
        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["error"]["code"], "UNSUPPORTED_MEDIA");

        server.shutdown();
    }

    #[tokio::test]
    async fn empty_upload_returns_400() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        let form = reqwest::multipart::Form::new().text("note", "no files here");
        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        server.shutdown();
    }

    #[tokio::test]
    async fn analysis_failure_surfaces_as_502_and_records_nothing() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::failing("quota"))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(image_form("report.png"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["error"]["code"], "ANALYSIS_FAILED");

        let records: serde_json::Value = reqwest::get(format!("{base}/api/records"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(records["count"], 0);

        server.shutdown();
    }

    #[tokio::test]
    async fn csv_export_has_one_row_per_record() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        client
            .post(format!("{base}/api/reports"))
            .multipart(image_form("report.png"))
            .send()
            .await
            .unwrap();

        let resp = reqwest::get(format!("{base}/api/export/csv")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/csv"
        );
        assert!(resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("annotated_reports.csv"));

        let body = resp.text().await.unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "image,key_value_pair,table,other_details");
        assert!(lines[1].starts_with("report.png,"));

        server.shutdown();
    }

    #[tokio::test]
    async fn clear_starts_a_fresh_session() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        let base = format!("http://127.0.0.1:{}", server.session.port);
        let client = reqwest::Client::new();

        client
            .post(format!("{base}/api/reports"))
            .multipart(image_form("report.png"))
            .send()
            .await
            .unwrap();

        let resp = client
            .delete(format!("{base}/api/records"))
            .send()
            .await
            .unwrap();
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["cleared"], 1);

        // The same filename can be annotated again now.
        let resp = client
            .post(format!("{base}/api/reports"))
            .multipart(image_form("report.png"))
            .send()
            .await
            .unwrap();
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["results"][0]["status"], "annotated");

        server.shutdown();
    }

    #[tokio::test]
    async fn server_session_has_valid_metadata() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);
        assert!(server.session.server_addr.contains(':'));
        assert!(!server.session.started_at.is_empty());
        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_test_server(test_ctx(MockAnalysisClient::new(sample_result()))).await;
        server.shutdown();
        server.shutdown(); // Second call should be safe
    }
}
