//! Job data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ScrapeError;
use crate::extraction::{GroupPostRecord, MarketplaceListingRecord};

/// Opaque job identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What a job searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    #[serde(rename = "group")]
    GroupSearch,
    #[serde(rename = "marketplace")]
    MarketplaceSearch,
}

impl JobKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GroupSearch => "group",
            Self::MarketplaceSearch => "marketplace",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(Self::GroupSearch),
            "marketplace" => Ok(Self::MarketplaceSearch),
            other => Err(ScrapeError::validation(format!(
                "unknown job type '{other}', expected 'group' or 'marketplace'"
            ))),
        }
    }
}

/// Lifecycle state. Forward only: Pending → Running → Completed | Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, non-empty keyword list
///
/// Only constructed through [`Keywords::new`], which lower-cases, trims, drops
/// blanks and collapses duplicates keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(raw: I) -> Result<Self, ScrapeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = Vec::new();
        for kw in raw {
            let kw = kw.as_ref().trim().to_lowercase();
            if !kw.is_empty() && !keywords.contains(&kw) {
                keywords.push(kw);
            }
        }

        if keywords.is_empty() {
            return Err(ScrapeError::validation("keyword list is empty"));
        }
        Ok(Self(keywords))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Keywords {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Targets of a job, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobTargets {
    GroupSearch { group_urls: Vec<String> },
    MarketplaceSearch { zip_codes: Vec<String> },
}

impl JobTargets {
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::GroupSearch { .. } => JobKind::GroupSearch,
            Self::MarketplaceSearch { .. } => JobKind::MarketplaceSearch,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::GroupSearch { group_urls } => group_urls.len(),
            Self::MarketplaceSearch { zip_codes } => zip_codes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validated job definition, immutable once registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub keywords: Keywords,
    pub targets: JobTargets,
}

impl JobSpec {
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.targets.kind()
    }
}

/// Records produced by a completed job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobResults {
    Groups(Vec<GroupPostRecord>),
    Marketplace(Vec<MarketplaceListingRecord>),
}

impl JobResults {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Groups(records) => records.len(),
            Self::Marketplace(records) => records.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point-in-time view of a job
///
/// Results are shared behind an `Arc`, so polling a large job does not copy
/// its records.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub spec: Arc<JobSpec>,
    pub status: JobStatus,
    pub results: Option<Arc<JobResults>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    #[must_use]
    pub fn kind(&self) -> JobKind {
        self.spec.kind()
    }

    #[must_use]
    pub fn keywords(&self) -> &Keywords {
        &self.spec.keywords
    }

    #[must_use]
    pub fn targets(&self) -> &JobTargets {
        &self.spec.targets
    }

    #[must_use]
    pub fn results_count(&self) -> usize {
        self.results.as_deref().map_or(0, JobResults::len)
    }
}
