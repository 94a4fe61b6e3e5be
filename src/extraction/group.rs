//! Group-post extraction
//!
//! Each group URL is opened, switched to its discussion view when one is
//! offered, and scrolled. Every rendered post whose text contains at least one
//! keyword becomes a [`GroupPostRecord`]. Posts are deduplicated by their
//! visible text within a group.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use super::matching::matching_keywords;
use super::scroll::ScrollSession;
use super::{ExtractionStrategy, GroupPostRecord, ScrollTunables};
use crate::driver::{AutomationDriver, ElementHandle};
use crate::error::{ScrapeError, ScrapeResult};
use crate::jobs::{JobId, JobKind, JobResults, Keywords};
use crate::utils::{GROUP_PREVIEW_MAX_CHARS, resolve_link, safe_truncate_chars};

/// Rendered post containers
pub const POST_SELECTOR: &str = "div[role='article']";

/// Tab-like elements that may carry the "Discussion" label
pub const TAB_SELECTOR: &str = "a[role='tab'], div[role='tab'], div[role='tablist'] a";

/// Permalink inside a post
pub const POST_LINK_SELECTOR: &str = "a[href*='/posts/']";

const DISCUSSION_LABEL: &str = "discussion";

pub struct GroupStrategy {
    group_urls: Vec<String>,
    base: Url,
    tunables: ScrollTunables,
}

impl GroupStrategy {
    #[must_use]
    pub fn new(group_urls: Vec<String>, base: Url, tunables: ScrollTunables) -> Self {
        Self {
            group_urls,
            base,
            tunables,
        }
    }

    async fn collect_group(
        &self,
        job_id: &JobId,
        group_url: &str,
        driver: &dyn AutomationDriver,
        keywords: &Keywords,
        records: &mut Vec<GroupPostRecord>,
    ) -> ScrapeResult<()> {
        let mut session = ScrollSession::open(driver, group_url, &self.tunables).await?;
        open_discussion_tab(session.driver()).await;

        let mut seen: HashSet<String> = HashSet::new();
        let emitted_before = records.len();

        'scrolling: while let Some(batch) = session.next_batch(POST_SELECTOR).await {
            for post in &batch {
                if self.is_full(&seen) {
                    break 'scrolling;
                }

                let text = match read_post_text(post.as_ref()).await {
                    Ok(Some(text)) => text,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!("Job {job_id}: skipping post in {group_url}: {e}");
                        continue;
                    }
                };
                let text = text.trim();

                let preview = safe_truncate_chars(text, GROUP_PREVIEW_MAX_CHARS);
                if !seen.insert(preview.to_string()) {
                    continue;
                }

                let matched = matching_keywords(preview, keywords);
                if matched.is_empty() {
                    continue;
                }

                records.push(GroupPostRecord {
                    group_url: group_url.to_string(),
                    text_preview: preview.to_string(),
                    matched_keywords: matched,
                    post_link: self.post_link(post.as_ref()).await,
                    scraped_at: Utc::now(),
                });
            }

            if self.is_full(&seen) {
                break;
            }
        }

        info!(
            "Job {job_id}: {group_url} yielded {} matching posts out of {} seen",
            records.len() - emitted_before,
            seen.len()
        );
        Ok(())
    }

    fn is_full(&self, seen: &HashSet<String>) -> bool {
        self.tunables
            .max_items
            .is_some_and(|max_items| seen.len() >= max_items)
    }

    async fn post_link(&self, post: &dyn ElementHandle) -> String {
        match post.descendant_attribute(POST_LINK_SELECTOR, "href").await {
            Ok(Some(href)) => resolve_link(&self.base, &href).unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                debug!("Post link unavailable: {e}");
                String::new()
            }
        }
    }
}

/// Visible text of a post, `None` when it renders nothing
async fn read_post_text(post: &dyn ElementHandle) -> ScrapeResult<Option<String>> {
    let text = post
        .inner_text()
        .await
        .map_err(|e| ScrapeError::extraction(format!("unreadable post: {e}")))?;
    Ok(text.filter(|text| !text.trim().is_empty()))
}

/// Click the "Discussion" tab when the group shows one
///
/// Groups without tabs open straight on their feed, so every failure here is
/// ignored.
async fn open_discussion_tab(driver: &dyn AutomationDriver) {
    let tabs = match driver.query_all(TAB_SELECTOR).await {
        Ok(tabs) => tabs,
        Err(e) => {
            debug!("No tab bar found: {e}");
            return;
        }
    };

    for tab in &tabs {
        let Ok(Some(label)) = tab.inner_text().await else {
            continue;
        };
        if label.trim().eq_ignore_ascii_case(DISCUSSION_LABEL) {
            match tab.click().await {
                Ok(()) => debug!("Opened discussion view"),
                Err(e) => debug!("Discussion tab click failed: {e}"),
            }
            return;
        }
    }
}

#[async_trait]
impl ExtractionStrategy for GroupStrategy {
    fn kind(&self) -> JobKind {
        JobKind::GroupSearch
    }

    async fn run(
        &self,
        job_id: &JobId,
        driver: &dyn AutomationDriver,
        keywords: &Keywords,
    ) -> ScrapeResult<JobResults> {
        let mut records = Vec::new();

        for group_url in &self.group_urls {
            match self
                .collect_group(job_id, group_url, driver, keywords, &mut records)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_job_fatal() => return Err(e),
                Err(e) => warn!("Job {job_id}: skipping group target: {e}"),
            }
        }

        Ok(JobResults::Groups(records))
    }
}
