//! Job orchestration
//!
//! [`JobOrchestrator::submit`] validates a request, registers the job and
//! spawns one task per job. The task is the job's only writer: it stores and
//! loads the credentials, launches a browser session, runs the strategy
//! selected by the job's targets, and records exactly one terminal transition.
//! Callers learn the outcome only through the registry.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::registry::{JobRegistry, RegistryError, Transition};
use super::request::JobRequest;
use super::types::{Job, JobId, JobResults, JobSpec, JobStatus};
use crate::config::ScrapeConfig;
use crate::credentials::{self, CredentialArtifact};
use crate::driver::SessionLauncher;
use crate::error::{ScrapeError, ScrapeResult};
use crate::export::{ExportError, ExportFormat, format_results};
use crate::extraction::strategy_for;

/// Errors from [`JobOrchestrator::export`]
#[derive(Debug, thiserror::Error)]
pub enum JobExportError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Job {id} is {status}; only completed jobs can be exported")]
    NotCompleted { id: JobId, status: JobStatus },

    #[error(transparent)]
    Format(#[from] ExportError),
}

#[derive(Clone)]
pub struct JobOrchestrator {
    registry: Arc<JobRegistry>,
    launcher: Arc<dyn SessionLauncher>,
    config: Arc<ScrapeConfig>,
}

impl JobOrchestrator {
    #[must_use]
    pub fn new(config: ScrapeConfig, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new(config.job_retention())),
            launcher,
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Start the registry's retention sweep
    pub fn start_cleanup_task(&self) -> JoinHandle<()> {
        Arc::clone(&self.registry).start_cleanup_task(self.config.cleanup_interval())
    }

    /// Validate and start a job, returning its id without waiting for it
    ///
    /// # Errors
    /// `ScrapeError::Validation` for malformed keywords or targets. No job is
    /// registered in that case. Credential problems are not checked here; they
    /// fail the job.
    pub async fn submit(&self, request: JobRequest) -> ScrapeResult<JobId> {
        let spec = request.to_spec()?;
        // Nothing may await between registering the job and spawning its task:
        // a submitter dropped in between would strand the job in Pending.
        let job = self.registry.create(spec).await;
        let job_id = job.id;

        info!(
            "Job {job_id}: submitted {} search, {} keywords, {} targets",
            job.kind(),
            job.keywords().len(),
            job.targets().len()
        );

        tokio::spawn(run_job(
            job_id,
            Arc::clone(&job.spec),
            request.credentials,
            Arc::clone(&self.registry),
            Arc::clone(&self.launcher),
            Arc::clone(&self.config),
        ));

        Ok(job_id)
    }

    pub async fn status(&self, id: &JobId) -> Result<Job, RegistryError> {
        self.registry.get(id).await
    }

    /// Render a completed job's results
    pub async fn export(&self, id: &JobId, format: ExportFormat) -> Result<String, JobExportError> {
        let job = self.registry.get(id).await?;
        match (job.status, job.results.as_deref()) {
            (JobStatus::Completed, Some(results)) => Ok(format_results(results, format)?),
            (status, _) => Err(JobExportError::NotCompleted { id: *id, status }),
        }
    }
}

async fn run_job(
    job_id: JobId,
    spec: Arc<JobSpec>,
    credentials: Option<Vec<u8>>,
    registry: Arc<JobRegistry>,
    launcher: Arc<dyn SessionLauncher>,
    config: Arc<ScrapeConfig>,
) {
    let artifact = store_credentials(&job_id, credentials, &config).await;

    if let Err(e) = registry.transition(&job_id, Transition::Start).await {
        error!("Job {job_id}: could not start: {e}");
        return;
    }
    info!("Job {job_id}: running");

    // The artifact moves into the pipeline future, so it is dropped (and the
    // file removed) when the future completes or unwinds.
    let pipeline = run_pipeline(job_id, spec, artifact, launcher.as_ref(), &config);
    let transition = match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(Ok(results)) => {
            info!("Job {job_id}: completed with {} records", results.len());
            Transition::Complete(results)
        }
        Ok(Err(e)) => {
            warn!("Job {job_id}: failed: {e}");
            Transition::Fail(e.to_string())
        }
        Err(panic) => {
            let message = ScrapeError::Unexpected(format!(
                "extraction task panicked: {}",
                panic_message(panic.as_ref())
            ));
            error!("Job {job_id}: {message}");
            Transition::Fail(message.to_string())
        }
    };

    if let Err(e) = registry.transition(&job_id, transition).await {
        error!("Job {job_id}: could not record outcome: {e}");
    }
}

/// Persist the uploaded cookie export for the job's lifetime
///
/// A write failure is not reported here; it fails the job once it is running.
async fn store_credentials(
    job_id: &JobId,
    credentials: Option<Vec<u8>>,
    config: &ScrapeConfig,
) -> ScrapeResult<Option<CredentialArtifact>> {
    let Some(bytes) = credentials else {
        return Ok(None);
    };
    CredentialArtifact::write(&config.credential_dir(), job_id, &bytes)
        .await
        .map(Some)
        .map_err(|e| ScrapeError::credential(format!("could not store credential artifact: {e}")))
}

async fn run_pipeline(
    job_id: JobId,
    spec: Arc<JobSpec>,
    artifact: ScrapeResult<Option<CredentialArtifact>>,
    launcher: &dyn SessionLauncher,
    config: &ScrapeConfig,
) -> ScrapeResult<JobResults> {
    let artifact = artifact?;
    let cookies = credentials::load(artifact.as_ref()).await?;
    let strategy = strategy_for(&spec.targets, config)?;

    let driver = launcher.launch(&job_id).await?;
    let outcome = async {
        driver
            .set_cookies(&cookies)
            .await
            .map_err(|e| ScrapeError::credential(e.to_string()))?;
        info!(
            "Job {job_id}: injected {} cookies, starting {} extraction",
            cookies.len(),
            strategy.kind()
        );
        strategy.run(&job_id, driver.as_ref(), &spec.keywords).await
    }
    .await;

    if let Err(e) = driver.close().await {
        warn!("Job {job_id}: browser close failed: {e}");
    }
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
