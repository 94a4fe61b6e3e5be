//! HTTP transport
//!
//! Thin axum layer over [`JobOrchestrator`]: multipart submission, status
//! polling, result export and a liveness probe. All job semantics live in the
//! orchestrator; handlers only translate between HTTP and it.

mod error;
mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::jobs::JobOrchestrator;

/// Upper bound for a submission (keyword file, group list and cookie export)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
}

/// Build the application router
pub fn router(orchestrator: JobOrchestrator) -> Router {
    Router::new()
        .route("/api/scrape/start", post(routes::start_scrape))
        .route("/api/scrape/status/:id", get(routes::scrape_status))
        .route("/api/scrape/export/:id", get(routes::export_results))
        .route("/api/health", get(routes::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { orchestrator })
}
