//! Embedded upload page.
//!
//! One static HTML page over the JSON API — no template engine, no
//! asset pipeline. The page is compiled into the binary.

use axum::response::Html;

/// `GET /` — the upload page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn page_has_upload_form_and_export_link() {
        let Html(page) = index().await;
        assert!(page.contains("upload-form"));
        assert!(page.contains("/api/reports"));
        assert!(page.contains("/api/export/csv"));
    }
}
