//! Extraction strategies
//!
//! A job's targets select exactly one strategy. Strategies drive an
//! [`AutomationDriver`] through the scroll-and-collect loop and turn what the
//! page renders into deduplicated, keyword-filtered records. Unreachable
//! targets and unreadable elements are logged and skipped; only job-fatal
//! errors are returned.

mod group;
mod marketplace;
mod matching;
mod records;
mod scroll;

use async_trait::async_trait;
use std::time::Duration;

pub use group::{GroupStrategy, POST_LINK_SELECTOR, POST_SELECTOR, TAB_SELECTOR};
pub use marketplace::{LISTING_SELECTOR, MarketplaceStrategy, canonical_listing_url, search_url};
pub use matching::matching_keywords;
pub use records::{GroupPostRecord, MarketplaceListingRecord};

use crate::config::ScrapeConfig;
use crate::driver::AutomationDriver;
use crate::error::ScrapeResult;
use crate::jobs::{JobId, JobKind, JobResults, JobTargets, Keywords};

/// Waits and caps for the scroll-and-collect loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollTunables {
    /// Wait after navigation before the first scroll
    pub navigation_settle: Duration,
    /// Wait after each scroll before querying
    pub scroll_settle: Duration,
    pub scroll_step_px: i64,
    pub max_scrolls: usize,
    /// Stop a target once this many distinct keys were seen
    pub max_items: Option<usize>,
    pub navigation_retries: u32,
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> JobKind;

    /// Visit every target and return the records found
    async fn run(
        &self,
        job_id: &JobId,
        driver: &dyn AutomationDriver,
        keywords: &Keywords,
    ) -> ScrapeResult<JobResults>;
}

/// Strategy for a job's targets
pub fn strategy_for(
    targets: &JobTargets,
    config: &ScrapeConfig,
) -> ScrapeResult<Box<dyn ExtractionStrategy>> {
    let base = config.base()?;
    Ok(match targets {
        JobTargets::GroupSearch { group_urls } => Box::new(GroupStrategy::new(
            group_urls.clone(),
            base,
            config.group_tunables(),
        )),
        JobTargets::MarketplaceSearch { zip_codes } => Box::new(MarketplaceStrategy::new(
            zip_codes.clone(),
            base,
            config.marketplace_tunables(),
        )),
    })
}
