//! Marketplace-listing extraction
//!
//! One search per ZIP × keyword pair. Listings are deduplicated by URL across
//! the whole job, so a listing surfaced by several searches is reported once,
//! under the first search that found it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use super::scroll::ScrollSession;
use super::{ExtractionStrategy, MarketplaceListingRecord, ScrollTunables};
use crate::driver::{AutomationDriver, ElementHandle};
use crate::error::{ScrapeError, ScrapeResult};
use crate::jobs::{JobId, JobKind, JobResults, Keywords};
use crate::utils::{LISTING_TITLE_MAX_CHARS, normalize_whitespace, resolve_link, safe_truncate_chars};

/// Listing cards
pub const LISTING_SELECTOR: &str = "a[href*='/marketplace/item/']";

/// Search URL for one ZIP × keyword pair
#[must_use]
pub fn search_url(base: &Url, zip_code: &str, keyword: &str) -> String {
    format!(
        "{}/marketplace/{}/search/?query={}&exact=false",
        base.as_str().trim_end_matches('/'),
        urlencoding::encode(zip_code),
        urlencoding::encode(keyword)
    )
}

/// Listing URL without tracking query or fragment
///
/// The same item is linked with different `?ref=` parameters from different
/// searches.
#[must_use]
pub fn canonical_listing_url(base: &Url, href: &str) -> Option<String> {
    let resolved = resolve_link(base, href)?;
    let mut url = Url::parse(&resolved).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

pub struct MarketplaceStrategy {
    zip_codes: Vec<String>,
    base: Url,
    tunables: ScrollTunables,
}

impl MarketplaceStrategy {
    #[must_use]
    pub fn new(zip_codes: Vec<String>, base: Url, tunables: ScrollTunables) -> Self {
        Self {
            zip_codes,
            base,
            tunables,
        }
    }

    async fn collect_search(
        &self,
        job_id: &JobId,
        zip_code: &str,
        keyword: &str,
        driver: &dyn AutomationDriver,
        seen: &mut HashSet<String>,
        records: &mut Vec<MarketplaceListingRecord>,
    ) -> ScrapeResult<()> {
        let url = search_url(&self.base, zip_code, keyword);
        let mut session = ScrollSession::open(driver, &url, &self.tunables).await?;
        let emitted_before = records.len();

        while let Some(batch) = session.next_batch(LISTING_SELECTOR).await {
            for card in &batch {
                match self.read_listing(card.as_ref(), zip_code, keyword, seen).await {
                    Ok(Some(record)) => {
                        seen.insert(record.url.clone());
                        records.push(record);
                    }
                    Ok(None) => {}
                    Err(e) => debug!("Job {job_id}: skipping listing card: {e}"),
                }
            }
        }

        info!(
            "Job {job_id}: {zip_code} / '{keyword}' yielded {} new listings",
            records.len() - emitted_before
        );
        Ok(())
    }

    /// Build a record for a card not seen earlier in the job
    ///
    /// `Ok(None)` for cards without a listing link or already reported.
    async fn read_listing(
        &self,
        card: &dyn ElementHandle,
        zip_code: &str,
        keyword: &str,
        seen: &HashSet<String>,
    ) -> ScrapeResult<Option<MarketplaceListingRecord>> {
        let href = card
            .attribute("href")
            .await
            .map_err(|e| ScrapeError::extraction(format!("unreadable listing href: {e}")))?;
        let Some(url) = href.and_then(|href| canonical_listing_url(&self.base, &href)) else {
            return Ok(None);
        };
        if seen.contains(&url) {
            return Ok(None);
        }

        let text = card
            .inner_text()
            .await
            .map_err(|e| ScrapeError::extraction(format!("unreadable listing {url}: {e}")))?
            .unwrap_or_default();
        let title = normalize_whitespace(&text);

        Ok(Some(MarketplaceListingRecord {
            zip_code: zip_code.to_string(),
            keyword: keyword.to_string(),
            title: safe_truncate_chars(&title, LISTING_TITLE_MAX_CHARS).to_string(),
            url,
            scraped_at: Utc::now(),
        }))
    }
}

#[async_trait]
impl ExtractionStrategy for MarketplaceStrategy {
    fn kind(&self) -> JobKind {
        JobKind::MarketplaceSearch
    }

    async fn run(
        &self,
        job_id: &JobId,
        driver: &dyn AutomationDriver,
        keywords: &Keywords,
    ) -> ScrapeResult<JobResults> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        for zip_code in &self.zip_codes {
            for keyword in keywords {
                match self
                    .collect_search(job_id, zip_code, keyword, driver, &mut seen, &mut records)
                    .await
                {
                    Ok(()) => {}
                    Err(e) if e.is_job_fatal() => return Err(e),
                    Err(e) => warn!("Job {job_id}: skipping search: {e}"),
                }
            }
        }

        Ok(JobResults::Marketplace(records))
    }
}
