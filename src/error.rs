//! Error taxonomy for scrape jobs
//!
//! Only `Validation` is surfaced synchronously to a submitter. `Credential` and
//! `Unexpected` are job-fatal and end up in the job's error message.
//! `Navigation` and `Extraction` never leave the extraction strategies: they are
//! logged and the offending target or candidate is skipped.

use crate::driver::DriverError;

/// Errors produced by the scrape job pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// Malformed submission (bad structured field, empty keyword set)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or unreadable credential artifact, or cookie injection failure
    #[error("Credential error: {0}")]
    Credential(String),

    /// A target could not be reached
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A single candidate element could not be read
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Anything else inside a job task
    #[error("{0}")]
    Unexpected(String),
}

impl ScrapeError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    pub(crate) fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Whether this error ends the whole job
    #[must_use]
    pub const fn is_job_fatal(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::Unexpected(_))
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::Unexpected(format!("{err:#}"))
    }
}

impl From<DriverError> for ScrapeError {
    fn from(err: DriverError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;
