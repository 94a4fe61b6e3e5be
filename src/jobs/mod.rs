//! Job lifecycle: data model, submission parsing, registry and orchestration

mod orchestrator;
mod registry;
mod request;
mod types;

pub use orchestrator::{JobExportError, JobOrchestrator};
pub use registry::{JobRegistry, RegistryError, Transition};
pub use request::{JobRequest, parse_group_targets, parse_keywords, parse_zip_codes};
pub use types::{Job, JobId, JobKind, JobResults, JobSpec, JobStatus, JobTargets, Keywords};
