//! Getter methods for `ScrapeConfig`

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::types::ScrapeConfig;
use crate::extraction::ScrollTunables;

impl ScrapeConfig {
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parsed base URL; `validate()` guarantees this succeeds for built configs
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| anyhow!("Invalid base_url '{}': {e}", self.base_url))
    }

    /// Directory credential artifacts are written to
    #[must_use]
    pub fn credential_dir(&self) -> PathBuf {
        self.credential_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn navigation_retries(&self) -> u32 {
        self.navigation_retries
    }

    #[must_use]
    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }

    /// Scroll-and-collect tunables for group targets
    #[must_use]
    pub fn group_tunables(&self) -> ScrollTunables {
        ScrollTunables {
            navigation_settle: Duration::from_millis(self.navigation_settle_ms),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            scroll_step_px: self.scroll_step_px,
            max_scrolls: self.group_max_scrolls,
            max_items: Some(self.group_max_items),
            navigation_retries: self.navigation_retries,
        }
    }

    /// Scroll-and-collect tunables for marketplace searches (no item cap)
    #[must_use]
    pub fn marketplace_tunables(&self) -> ScrollTunables {
        ScrollTunables {
            navigation_settle: Duration::from_millis(self.navigation_settle_ms),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            scroll_step_px: self.scroll_step_px,
            max_scrolls: self.marketplace_max_scrolls,
            max_items: None,
            navigation_retries: self.navigation_retries,
        }
    }
}
