//! Core configuration types for scrape jobs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_BASE_URL, DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_GROUP_MAX_ITEMS,
    DEFAULT_GROUP_MAX_SCROLLS, DEFAULT_JOB_RETENTION_SECS, DEFAULT_MARKETPLACE_MAX_SCROLLS,
    DEFAULT_NAVIGATION_RETRIES, DEFAULT_NAVIGATION_SETTLE_MS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
    DEFAULT_SCROLL_SETTLE_MS, DEFAULT_SCROLL_STEP_PX,
};

/// Main configuration struct for scrape jobs
///
/// Every timing value here is a tunable. The settle waits and scroll caps are
/// the heuristic that decides when a page is "loaded enough"; none of them is a
/// correctness guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Base URL relative links resolve against and search URLs are built on
    pub(crate) base_url: String,

    /// Directory for per-job temporary credential artifacts
    ///
    /// Default: the system temp directory
    pub(crate) credential_dir: Option<PathBuf>,

    pub(crate) headless: bool,

    /// Explicit Chrome/Chromium binary. `CHROMIUM_PATH` and well-known install
    /// locations are searched when unset.
    pub(crate) chrome_executable: Option<PathBuf>,

    /// Timeout in seconds for a single `page.goto()`
    ///
    /// Default: 30 seconds
    pub(crate) page_load_timeout_secs: u64,

    /// Extra attempts for a navigation that failed transiently
    ///
    /// Set to 0 to skip a target on its first navigation failure.
    ///
    /// Default: 2
    pub(crate) navigation_retries: u32,

    pub(crate) navigation_settle_ms: u64,
    pub(crate) scroll_settle_ms: u64,
    pub(crate) scroll_step_px: i64,

    pub(crate) group_max_scrolls: usize,

    /// Stop a group target once this many distinct posts were inspected
    pub(crate) group_max_items: usize,

    pub(crate) marketplace_max_scrolls: usize,

    /// How long terminal jobs stay queryable before the sweep evicts them
    ///
    /// Default: 3600 seconds
    pub(crate) job_retention_secs: u64,

    pub(crate) cleanup_interval_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credential_dir: None,
            headless: true,
            chrome_executable: None,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            navigation_retries: DEFAULT_NAVIGATION_RETRIES,
            navigation_settle_ms: DEFAULT_NAVIGATION_SETTLE_MS,
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
            scroll_step_px: DEFAULT_SCROLL_STEP_PX,
            group_max_scrolls: DEFAULT_GROUP_MAX_SCROLLS,
            group_max_items: DEFAULT_GROUP_MAX_ITEMS,
            marketplace_max_scrolls: DEFAULT_MARKETPLACE_MAX_SCROLLS,
            job_retention_secs: DEFAULT_JOB_RETENTION_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}
