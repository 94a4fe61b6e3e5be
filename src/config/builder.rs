//! Fluent builder for `ScrapeConfig`
//!
//! Every field has a default, so unlike a crawl config there is nothing the
//! caller must set; `build()` only rejects values that would make the
//! scroll-and-collect loop meaningless.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use url::Url;

use super::types::ScrapeConfig;
use crate::utils::MAX_NAVIGATION_RETRIES;

#[derive(Debug, Clone, Default)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }

    /// Load a config from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the extraction loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| anyhow!("Invalid base_url '{}': {e}", self.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("base_url must be http(s), got '{}'", self.base_url));
        }
        if self.group_max_scrolls == 0 || self.marketplace_max_scrolls == 0 {
            return Err(anyhow!("max_scrolls must be at least 1"));
        }
        if self.group_max_items == 0 {
            return Err(anyhow!("group_max_items must be at least 1"));
        }
        if self.scroll_step_px == 0 {
            return Err(anyhow!("scroll_step_px must be non-zero"));
        }
        if self.navigation_retries > MAX_NAVIGATION_RETRIES {
            return Err(anyhow!(
                "navigation_retries must be at most {MAX_NAVIGATION_RETRIES}, got {}",
                self.navigation_retries
            ));
        }
        if self.page_load_timeout_secs == 0 {
            return Err(anyhow!("page_load_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

impl ScrapeConfigBuilder {
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn credential_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.credential_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_retries(mut self, retries: u32) -> Self {
        self.config.navigation_retries = retries;
        self
    }

    /// Set both settle waits at once (tests use zero)
    #[must_use]
    pub fn settle_ms(mut self, navigation_ms: u64, scroll_ms: u64) -> Self {
        self.config.navigation_settle_ms = navigation_ms;
        self.config.scroll_settle_ms = scroll_ms;
        self
    }

    #[must_use]
    pub fn scroll_step_px(mut self, px: i64) -> Self {
        self.config.scroll_step_px = px;
        self
    }

    #[must_use]
    pub fn group_max_scrolls(mut self, scrolls: usize) -> Self {
        self.config.group_max_scrolls = scrolls;
        self
    }

    #[must_use]
    pub fn group_max_items(mut self, items: usize) -> Self {
        self.config.group_max_items = items;
        self
    }

    #[must_use]
    pub fn marketplace_max_scrolls(mut self, scrolls: usize) -> Self {
        self.config.marketplace_max_scrolls = scrolls;
        self
    }

    #[must_use]
    pub fn job_retention_secs(mut self, secs: u64) -> Self {
        self.config.job_retention_secs = secs;
        self
    }

    #[must_use]
    pub fn cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.config.cleanup_interval_secs = secs;
        self
    }

    pub fn build(self) -> Result<ScrapeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
