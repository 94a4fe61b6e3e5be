//! In-memory job registry
//!
//! The registry is the only state shared between the task running a job and
//! the callers polling it. Each job has exactly one writer (its task), which
//! moves it forward with [`Transition`]s; status, results and error message
//! change together under one lock, so readers never see a half-written job.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::types::{Job, JobId, JobResults, JobSpec, JobStatus};

/// Initial capacity for the job map
const JOB_MAP_INITIAL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Job {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

/// A status change together with its payload
#[derive(Debug, Clone)]
pub enum Transition {
    /// Pending → Running
    Start,
    /// Running → Completed, publishing the results
    Complete(JobResults),
    /// Running → Failed with a human-readable cause
    Fail(String),
}

impl Transition {
    #[must_use]
    pub const fn target(&self) -> JobStatus {
        match self {
            Self::Start => JobStatus::Running,
            Self::Complete(_) => JobStatus::Completed,
            Self::Fail(_) => JobStatus::Failed,
        }
    }

    const fn allowed_from(&self, current: JobStatus) -> bool {
        matches!(
            (current, self),
            (JobStatus::Pending, Self::Start)
                | (JobStatus::Running, Self::Complete(_) | Self::Fail(_))
        )
    }
}

struct JobEntry {
    job: Job,
    status_tx: watch::Sender<JobStatus>,
}

/// Registry of all jobs known to this process
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, JobEntry>>>,
    retention: Duration,
}

impl JobRegistry {
    /// Create a registry that keeps terminal jobs for `retention` before the
    /// cleanup sweep may evict them
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::with_capacity(
                JOB_MAP_INITIAL_CAPACITY,
            ))),
            retention,
        }
    }

    /// Register a new job in `Pending`
    pub async fn create(&self, spec: JobSpec) -> Job {
        let job = Job {
            id: JobId::new(),
            spec: Arc::new(spec),
            status: JobStatus::Pending,
            results: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        let (status_tx, _) = watch::channel(JobStatus::Pending);

        let mut jobs = self.jobs.lock().await;
        jobs.insert(
            job.id,
            JobEntry {
                job: job.clone(),
                status_tx,
            },
        );
        log::debug!("Registered {} job {}", job.kind(), job.id);
        job
    }

    /// Snapshot of a job
    pub async fn get(&self, id: &JobId) -> Result<Job, RegistryError> {
        let jobs = self.jobs.lock().await;
        jobs.get(id)
            .map(|entry| entry.job.clone())
            .ok_or(RegistryError::NotFound(*id))
    }

    /// Apply a transition, returning the updated snapshot
    ///
    /// Anything but Pending → Running → {Completed | Failed} is rejected, so a
    /// terminal job can never be written twice.
    pub async fn transition(
        &self,
        id: &JobId,
        transition: Transition,
    ) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.lock().await;
        let entry = jobs.get_mut(id).ok_or(RegistryError::NotFound(*id))?;

        let from = entry.job.status;
        let to = transition.target();
        if !transition.allowed_from(from) {
            log::warn!("Rejected transition {from} -> {to} for job {id}");
            return Err(RegistryError::InvalidTransition { id: *id, from, to });
        }

        let now = Utc::now();
        let job = &mut entry.job;
        match transition {
            Transition::Start => job.started_at = Some(now),
            Transition::Complete(results) => {
                job.results = Some(Arc::new(results));
                job.finished_at = Some(now);
            }
            Transition::Fail(message) => {
                job.error_message = Some(message);
                job.finished_at = Some(now);
            }
        }
        job.status = to;

        // send_replace never fails, even with no receivers
        entry.status_tx.send_replace(to);
        log::debug!("Job {id}: {from} -> {to}");
        Ok(entry.job.clone())
    }

    /// Watch a job's status
    pub async fn subscribe(&self, id: &JobId) -> Result<watch::Receiver<JobStatus>, RegistryError> {
        let jobs = self.jobs.lock().await;
        jobs.get(id)
            .map(|entry| entry.status_tx.subscribe())
            .ok_or(RegistryError::NotFound(*id))
    }

    /// Resolve once the job reaches a terminal state
    pub async fn wait_for_terminal(&self, id: &JobId) -> Result<Job, RegistryError> {
        let mut rx = self.subscribe(id).await?;
        // Err means the entry (and its sender) was evicted while we waited
        rx.wait_for(JobStatus::is_terminal)
            .await
            .map_err(|_| RegistryError::NotFound(*id))?;
        self.get(id).await
    }

    /// Snapshots of all jobs, oldest first
    pub async fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.lock().await;
        let mut all: Vec<Job> = jobs.values().map(|entry| entry.job.clone()).collect();
        all.sort_by_key(|job| job.created_at);
        all
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Evict terminal jobs that finished more than `retention` ago
    ///
    /// Pending and running jobs are always kept. Returns the number evicted.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().await;
        let initial_count = jobs.len();

        jobs.retain(|id, entry| {
            let Some(finished_at) = entry.job.finished_at else {
                return true;
            };
            let age = now
                .signed_duration_since(finished_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let keep = age < self.retention;
            if !keep {
                log::debug!(
                    "Evicting job {id}: {} (finished {age:?} ago)",
                    entry.job.status
                );
            }
            keep
        });

        let cleaned = initial_count - jobs.len();
        if cleaned > 0 {
            log::info!("Evicted {cleaned} expired jobs");
        }
        cleaned
    }

    /// Start the periodic retention sweep (call once after wrapping in `Arc`)
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.cleanup_expired().await;
            }
        })
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::utils::DEFAULT_JOB_RETENTION_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobTargets, Keywords};

    fn spec() -> JobSpec {
        JobSpec {
            keywords: Keywords::new(["lot"]).unwrap(),
            targets: JobTargets::MarketplaceSearch {
                zip_codes: vec!["75147".into()],
            },
        }
    }

    #[tokio::test]
    async fn forward_path_is_enforced() {
        let registry = JobRegistry::default();
        let job = registry.create(spec()).await;

        let err = registry
            .transition(&job.id, Transition::Complete(JobResults::Marketplace(vec![])))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTransition {
                id: job.id,
                from: JobStatus::Pending,
                to: JobStatus::Completed
            }
        );

        registry.transition(&job.id, Transition::Start).await.unwrap();
        let done = registry
            .transition(&job.id, Transition::Fail("boom".into()))
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error_message.as_deref(), Some("boom"));
        assert!(done.results.is_none());

        // Terminal is final
        assert!(registry.transition(&job.id, Transition::Start).await.is_err());
        assert!(
            registry
                .transition(&job.id, Transition::Fail("again".into()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let registry = JobRegistry::default();
        let id = JobId::new();
        assert_eq!(registry.get(&id).await.unwrap_err(), RegistryError::NotFound(id));
    }

    #[tokio::test]
    async fn cleanup_keeps_running_jobs() {
        let registry = JobRegistry::new(Duration::ZERO);
        let running = registry.create(spec()).await;
        registry.transition(&running.id, Transition::Start).await.unwrap();

        let finished = registry.create(spec()).await;
        registry.transition(&finished.id, Transition::Start).await.unwrap();
        registry
            .transition(&finished.id, Transition::Complete(JobResults::Marketplace(vec![])))
            .await
            .unwrap();

        assert_eq!(registry.cleanup_expired().await, 1);
        assert!(registry.get(&running.id).await.is_ok());
        assert!(registry.get(&finished.id).await.is_err());
    }
}
