use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::ScrapeError;
use crate::jobs::{JobExportError, RegistryError};

/// Error body: `{"detail": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Validation(_) => Self::BadRequest(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => Self::NotFound(err.to_string()),
            RegistryError::InvalidTransition { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<JobExportError> for ApiError {
    fn from(err: JobExportError) -> Self {
        match err {
            JobExportError::Registry(e) => e.into(),
            JobExportError::NotCompleted { .. } => Self::Conflict(err.to_string()),
            JobExportError::Format(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::BadRequest(format!("Malformed multipart body: {err}"))
    }
}
