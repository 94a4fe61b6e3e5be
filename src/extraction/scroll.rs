//! Scroll-and-collect traversal shared by all strategies
//!
//! A target is opened once (navigation with retry, then a settle wait) and then
//! yields one batch of candidate elements per scroll step until the scroll cap
//! is reached or the page stops responding.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use super::ScrollTunables;
use crate::driver::{AutomationDriver, DriverError, DriverResult, Element};
use crate::error::{ScrapeError, ScrapeResult};
use crate::utils::MAX_BACKOFF_EXPONENT;

/// Delay before retry number `retry` (0-based), without jitter
fn backoff_base_ms(retry: u32) -> u64 {
    2u64.saturating_pow(retry.min(MAX_BACKOFF_EXPONENT)) * 1000
}

/// Navigate with exponential backoff and jitter on transient failures
///
/// Permanent failures (closed browser, login or CAPTCHA walls) are returned
/// without retrying.
pub(crate) async fn navigate_with_retry(
    driver: &dyn AutomationDriver,
    url: &str,
    max_retries: u32,
) -> DriverResult<()> {
    let mut retries = 0;
    loop {
        match driver.navigate(url).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                if !e.is_retryable() {
                    warn!("Non-retryable navigation error for {url}, failing fast: {e}");
                    return Err(e);
                }

                if retries >= max_retries {
                    warn!("Max navigation retries ({max_retries}) exceeded for {url}: {e}");
                    return Err(e);
                }

                let delay = backoff_base_ms(retries) + rand::rng().random_range(0..1000);
                warn!(
                    "Navigation to {url} failed, attempt {}/{max_retries}, retrying in {delay}ms: {e}",
                    retries + 1
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                retries += 1;
            }
        }
    }
}

/// An opened target being scrolled
pub(crate) struct ScrollSession<'a> {
    driver: &'a dyn AutomationDriver,
    tunables: &'a ScrollTunables,
    url: String,
    scrolls_done: usize,
}

impl<'a> ScrollSession<'a> {
    /// Navigate to `url` and let the first render settle
    ///
    /// # Errors
    /// `ScrapeError::Navigation` once retries are exhausted. The caller skips
    /// the target.
    pub(crate) async fn open(
        driver: &'a dyn AutomationDriver,
        url: &str,
        tunables: &'a ScrollTunables,
    ) -> ScrapeResult<Self> {
        navigate_with_retry(driver, url, tunables.navigation_retries)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        driver.wait(tunables.navigation_settle).await;
        debug!("Opened {url}");

        Ok(Self {
            driver,
            tunables,
            url: url.to_string(),
            scrolls_done: 0,
        })
    }

    pub(crate) fn driver(&self) -> &'a dyn AutomationDriver {
        self.driver
    }

    /// Scroll once, settle, and return every rendered candidate
    ///
    /// `None` once the scroll cap is reached or the page fails to scroll or
    /// answer the query. Elements already collected from earlier batches are
    /// unaffected.
    pub(crate) async fn next_batch(&mut self, selector: &str) -> Option<Vec<Element>> {
        if self.scrolls_done >= self.tunables.max_scrolls {
            return None;
        }
        self.scrolls_done += 1;

        if let Err(e) = self.driver.scroll_by(self.tunables.scroll_step_px).await {
            self.log_stop("scroll", &e);
            return None;
        }
        self.driver.wait(self.tunables.scroll_settle).await;

        match self.driver.query_all(selector).await {
            Ok(batch) => {
                debug!(
                    "{}: scroll {}/{} rendered {} candidates",
                    self.url,
                    self.scrolls_done,
                    self.tunables.max_scrolls,
                    batch.len()
                );
                Some(batch)
            }
            Err(e) => {
                self.log_stop("query", &e);
                None
            }
        }
    }

    fn log_stop(&self, step: &str, e: &DriverError) {
        warn!(
            "Stopping {} after {} scrolls: {step} failed: {e}",
            self.url, self.scrolls_done
        );
    }
}
