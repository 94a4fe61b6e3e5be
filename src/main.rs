// HTTP server for scrape jobs
//
// Serves the job submission, status and export routes over the Chromium
// launcher. Configure with SOCIALSCRAPE_BIND, SOCIALSCRAPE_CONFIG and RUST_LOG.

use anyhow::{Context, Result};
use kodegen_tools_socialscrape::{ChromiumLauncher, JobOrchestrator, ScrapeConfig, server};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND: &str = "0.0.0.0:8000";

fn load_config() -> Result<ScrapeConfig> {
    match std::env::var("SOCIALSCRAPE_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {path}");
            ScrapeConfig::from_json_file(&path)
        }
        Err(_) => ScrapeConfig::builder().build(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // log records from dependencies are bridged into the same subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kodegen_tools_socialscrape=debug,chromiumoxide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config().context("Failed to load configuration")?;
    let launcher = Arc::new(ChromiumLauncher::new(config.clone()));
    let orchestrator = JobOrchestrator::new(config, launcher);
    let cleanup = orchestrator.start_cleanup_task();

    let bind = std::env::var("SOCIALSCRAPE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;
    tracing::info!("Listening on {bind}");

    axum::serve(listener, server::router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cleanup.abort();
    Ok(())
}
