use pdf_uploader::config::get_configuration;
use pdf_uploader::pages::PageRegistry;
use pdf_uploader::services::FilesClient;
use pdf_uploader::startup::build_router;
use pdf_uploader::AppState;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "pdf-uploader",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    pdf_uploader::services::metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let files_client = Arc::new(FilesClient::new(configuration.files_api.clone())?);
    let pages = Arc::new(PageRegistry::new(
        files_client,
        configuration.files_api.page_size,
    ));

    let shutdown = CancellationToken::new();
    let sweeper = pages.spawn_sweeper(&configuration.pages, shutdown.clone());

    let app = build_router(
        AppState::new(pages.clone()),
        configuration.server.max_upload_bytes,
    );

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting pdf-uploader on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    shutdown.cancel();
    pages.shutdown_all();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Page sweeper ended abnormally");
    }
    info!("pdf-uploader stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
