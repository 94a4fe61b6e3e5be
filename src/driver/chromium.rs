//! chromiumoxide-backed automation driver
//!
//! Each job gets its own Chrome process with its own profile directory, so
//! cookie stores never leak between concurrently running jobs.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    AutomationDriver, DriverError, DriverResult, Element, ElementHandle, SessionLauncher,
    with_page_timeout,
};
use crate::browser_profile::{BrowserProfile, create_unique_profile_with_prefix};
use crate::browser_setup::{apply_stealth_measures, launch_browser};
use crate::config::ScrapeConfig;
use crate::credentials::{SameSite, SessionCookie};
use crate::error::{ScrapeError, ScrapeResult};
use crate::jobs::JobId;

/// Browser process, its CDP event handler and its profile directory
///
/// Dropping this aborts the handler and removes the profile even when
/// [`ChromiumDriver::close`] was never reached (panic, early return).
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    // Declared after `browser` so the process is gone before the dir is removed
    _profile: BrowserProfile,
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!("Dropping BrowserSession - aborting handler task");
        self.handler.abort();
    }
}

/// [`AutomationDriver`] over a single chromiumoxide page
pub struct ChromiumDriver {
    page: Page,
    session: Mutex<Option<BrowserSession>>,
    page_load_timeout_secs: u64,
}

impl ChromiumDriver {
    fn new(page: Page, session: BrowserSession, page_load_timeout_secs: u64) -> Self {
        Self {
            page,
            session: Mutex::new(Some(session)),
            page_load_timeout_secs,
        }
    }
}

fn protocol(e: impl std::fmt::Display) -> DriverError {
    DriverError::Protocol(e.to_string())
}

#[async_trait]
impl AutomationDriver for ChromiumDriver {
    async fn set_cookies(&self, cookies: &[SessionCookie]) -> DriverResult<()> {
        let params = cookies
            .iter()
            .map(to_cookie_param)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DriverError::Cookies)?;

        self.page
            .set_cookies(params)
            .await
            .map_err(|e| DriverError::Cookies(e.to_string()))?;

        debug!("Injected {} cookies into session", cookies.len());
        Ok(())
    }

    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>> {
        let cookies = self.page.get_cookies().await.map_err(protocol)?;
        Ok(cookies.into_iter().map(from_cdp_cookie).collect())
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        with_page_timeout(
            async {
                self.page
                    .goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| DriverError::Navigation(e.to_string()))
            },
            self.page_load_timeout_secs,
            "Navigation",
        )
        .await?;

        // Login walls redirect instead of failing the request
        if let Ok(Some(landed)) = self.page.url().await
            && (landed.contains("/login") || landed.contains("/checkpoint/"))
        {
            return Err(DriverError::LoginRequired(landed));
        }

        Ok(())
    }

    async fn current_url(&self) -> DriverResult<Option<String>> {
        self.page.url().await.map_err(protocol)
    }

    async fn scroll_by(&self, delta_y: i64) -> DriverResult<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {delta_y})"))
            .await
            .map(|_| ())
            .map_err(protocol)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        let nodes = self.page.find_elements(selector).await.map_err(protocol)?;
        Ok(nodes
            .into_iter()
            .map(|node| Box::new(ChromiumElement(node)) as Element)
            .collect())
    }

    async fn close(&self) -> DriverResult<()> {
        let Some(mut session) = self.session.lock().await.take() else {
            return Ok(());
        };

        let mut errors = Vec::new();
        if let Err(e) = session.browser.close().await {
            warn!("Failed to close browser: {e}");
            errors.push(format!("Browser close failed: {e}"));
        }
        // Wait for the process to exit so the profile directory is unlocked
        if let Err(e) = session.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
            errors.push(format!("Browser wait failed: {e}"));
        }
        drop(session);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DriverError::Protocol(errors.join("; ")))
        }
    }
}

struct ChromiumElement(CdpElement);

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn inner_text(&self) -> DriverResult<Option<String>> {
        self.0
            .inner_text()
            .await
            .map_err(|e| DriverError::Element(e.to_string()))
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.0
            .attribute(name)
            .await
            .map_err(|e| DriverError::Element(e.to_string()))
    }

    async fn descendant_attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> DriverResult<Option<String>> {
        let Ok(child) = self.0.find_element(selector).await else {
            return Ok(None);
        };
        child
            .attribute(name)
            .await
            .map_err(|e| DriverError::Element(e.to_string()))
    }

    async fn click(&self) -> DriverResult<()> {
        self.0
            .click()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Element(e.to_string()))
    }
}

fn to_cookie_param(cookie: &SessionCookie) -> Result<CookieParam, String> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);

    if let Some(expires) = cookie.expires.filter(|e| *e > 0.0) {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    if let Some(same_site) = cookie.same_site {
        builder = builder.same_site(match same_site {
            SameSite::Strict => CookieSameSite::Strict,
            SameSite::Lax => CookieSameSite::Lax,
            SameSite::None => CookieSameSite::None,
        });
    }

    builder
        .build()
        .map_err(|e| format!("cookie '{}': {e}", cookie.name))
}

fn from_cdp_cookie(cookie: Cookie) -> SessionCookie {
    SessionCookie {
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain,
        path: cookie.path,
        expires: (!cookie.session).then_some(cookie.expires),
        http_only: cookie.http_only,
        secure: cookie.secure,
        same_site: cookie.same_site.map(|s| match s {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }),
    }
}

/// Launches one stealth-configured Chrome per job
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: ScrapeConfig,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, job_id: &JobId) -> ScrapeResult<Box<dyn AutomationDriver>> {
        // UUID-suffixed profile keeps concurrent jobs from contending on SingletonLock
        let profile = create_unique_profile_with_prefix(&format!("socialscrape_chrome_{job_id}"))?;

        let (browser, handler) = launch_browser(
            self.config.headless(),
            self.config.chrome_executable(),
            profile.path(),
        )
        .await?;

        let session = BrowserSession {
            browser,
            handler,
            _profile: profile,
        };

        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Unexpected(format!("Failed to create blank page: {e}")))?;

        if let Err(e) = apply_stealth_measures(&page).await {
            warn!("Stealth injection failed for job {job_id}: {e}");
        }

        info!("Browser session ready for job {job_id}");
        Ok(Box::new(ChromiumDriver::new(
            page,
            session,
            self.config.page_load_timeout_secs(),
        )))
    }
}
