use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::export::ExportFormat;
use crate::jobs::{JobId, JobKind, JobRequest, JobStatus};

#[derive(Debug, Default)]
struct StartForm {
    kind: Option<String>,
    keywords: Option<String>,
    groups: Option<String>,
    zip_codes: Option<String>,
    cookies: Option<Vec<u8>>,
}

impl StartForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "type" => form.kind = Some(field.text().await?),
                "keywords" => form.keywords = Some(utf8(&name, field.bytes().await?.to_vec())?),
                "groups" => form.groups = Some(utf8(&name, field.bytes().await?.to_vec())?),
                "zip_codes" => form.zip_codes = Some(field.text().await?),
                "cookies" => form.cookies = Some(field.bytes().await?.to_vec()),
                other => tracing::debug!("Ignoring unknown form field '{other}'"),
            }
        }
        Ok(form)
    }

    fn into_request(self) -> Result<JobRequest, ApiError> {
        let kind: JobKind = self
            .kind
            .ok_or_else(|| ApiError::BadRequest("missing field 'type'".into()))?
            .parse()?;
        let keywords = self
            .keywords
            .ok_or_else(|| ApiError::BadRequest("missing field 'keywords'".into()))?;
        let targets = match kind {
            JobKind::GroupSearch => self
                .groups
                .ok_or_else(|| ApiError::BadRequest("missing field 'groups'".into()))?,
            JobKind::MarketplaceSearch => self.zip_codes.unwrap_or_default(),
        };

        Ok(JobRequest {
            kind,
            keywords,
            targets,
            credentials: self.cookies,
        })
    }
}

fn utf8(field: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
    String::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest(format!("field '{field}' is not valid UTF-8")))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Job {raw} not found")))
}

pub(super) async fn start_scrape(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let request = StartForm::read(multipart).await?.into_request()?;
    let job_id = state.orchestrator.submit(request).await?;
    Ok(Json(json!({ "scrape_id": job_id })))
}

#[derive(Debug, Serialize)]
pub(super) struct StatusResponse {
    id: JobId,
    #[serde(rename = "type")]
    kind: JobKind,
    status: JobStatus,
    results: Value,
    results_count: usize,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

pub(super) async fn scrape_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state.orchestrator.status(&parse_job_id(&id)?).await?;

    let results = match job.results.as_deref() {
        Some(results) => serde_json::to_value(results)
            .map_err(|e| ApiError::Internal(format!("Failed to serialize results: {e}")))?,
        None => json!([]),
    };

    Ok(Json(StatusResponse {
        id: job.id,
        kind: job.kind(),
        status: job.status,
        results_count: job.results_count(),
        results,
        error_message: job.error_message,
        created_at: job.created_at,
        started_at: job.started_at,
        finished_at: job.finished_at,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    format: Option<String>,
}

pub(super) async fn export_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = parse_job_id(&id)?;
    let format = match query.format.as_deref() {
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => ExportFormat::default(),
    };

    let body = state.orchestrator.export(&job_id, format).await?;
    let disposition = format!("attachment; filename=\"scrape_{job_id}.{}\"", format.extension());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "jobs": state.orchestrator.registry().len().await,
    }))
}
