//! Browser automation capability used by the extraction strategies
//!
//! The strategies never touch chromiumoxide directly. They see an
//! [`AutomationDriver`] (navigate, wait, scroll, query, cookies) and
//! [`ElementHandle`]s for the nodes a query returned. [`chromium`] provides the
//! production implementation; tests script their own.

pub mod chromium;
mod page_timeout;

use async_trait::async_trait;
use std::time::Duration;

use crate::credentials::SessionCookie;
use crate::error::ScrapeResult;
use crate::jobs::JobId;

pub use chromium::{ChromiumDriver, ChromiumLauncher};
pub use page_timeout::with_page_timeout;

/// Errors reported by an automation driver
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    #[error("{operation} timeout after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element unavailable: {0}")]
    Element(String),

    #[error("Cookie injection failed: {0}")]
    Cookies(String),

    /// Navigation landed on a login or checkpoint page instead of the target
    #[error("Redirected to {0}; session cookies were not accepted")]
    LoginRequired(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Browser session closed")]
    Closed,
}

impl DriverError {
    /// Classify errors into retryable vs permanent failures
    ///
    /// Closed sessions, login redirects and CAPTCHA walls will not recover by
    /// retrying.
    /// Timeouts and network resets usually do. Unknown protocol errors are
    /// retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Closed | Self::Cookies(_) | Self::LoginRequired(_) => false,
            Self::Navigation(msg) | Self::Protocol(msg) | Self::Element(msg) => {
                let msg = msg.to_lowercase();
                let permanent = msg.contains("browser closed")
                    || msg.contains("page closed")
                    || msg.contains("target closed")
                    || msg.contains("session closed")
                    || msg.contains("websocket")
                    || msg.contains("captcha")
                    || msg.contains("checkpoint");
                !permanent
            }
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// A DOM node returned by [`AutomationDriver::query_all`]
///
/// Nodes can go stale between the query and the read (the page keeps
/// re-rendering while it is scrolled), so every accessor is fallible.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Rendered text of the node
    async fn inner_text(&self) -> DriverResult<Option<String>>;

    /// Attribute of the node itself
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// Attribute of the first descendant matching `selector`, `None` when no
    /// descendant matches
    async fn descendant_attribute(&self, selector: &str, name: &str)
    -> DriverResult<Option<String>>;

    async fn click(&self) -> DriverResult<()>;
}

pub type Element = Box<dyn ElementHandle>;

/// One browser session, exclusive to a single job
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Inject cookies into the session context. Must precede any navigation.
    async fn set_cookies(&self, cookies: &[SessionCookie]) -> DriverResult<()>;

    /// Cookies currently held by the session
    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>>;

    async fn navigate(&self, url: &str) -> DriverResult<()>;

    async fn current_url(&self) -> DriverResult<Option<String>>;

    /// Scroll the viewport vertically by `delta_y` pixels
    async fn scroll_by(&self, delta_y: i64) -> DriverResult<()>;

    /// All currently rendered nodes matching `selector`
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>>;

    /// Fixed settle wait for dynamic content
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// Release the browser. Safe to call more than once.
    async fn close(&self) -> DriverResult<()>;
}

/// Acquires a fresh browser session for a job
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, job_id: &JobId) -> ScrapeResult<Box<dyn AutomationDriver>>;
}
