//! medannot — medical report annotation service.
//!
//! Uploads report images to a remote document-analysis API and
//! organizes the extracted key-value pairs, tables, and free text into
//! session records downloadable as CSV.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use medannot::api::server::start_server;
use medannot::api::types::ApiContext;
use medannot::config::{self, AppConfig};
use medannot::pipeline::analysis::AzureDocumentClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    medannot::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = AppConfig::from_env().context("configuration")?;

    // The analysis client is blocking; build and use it off the async
    // runtime threads.
    let client_config = app_config.clone();
    let analyzer =
        tokio::task::spawn_blocking(move || AzureDocumentClient::from_config(&client_config))
            .await
            .context("document-analysis client task")?
            .context("document-analysis client")?;

    let ctx = ApiContext::new(Arc::new(analyzer), app_config.batch_delay());
    let mut server = start_server(ctx, app_config.bind_addr)
        .await
        .map_err(anyhow::Error::msg)?;

    tracing::info!(
        addr = %server.session.server_addr,
        model = %app_config.model_id,
        "Upload page ready at http://{}/",
        server.session.server_addr
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown requested");
    server.shutdown();

    // Give in-flight requests a moment to drain.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
