//! Test utilities for the job pipeline: a scripted in-memory browser

#![allow(dead_code)]

use async_trait::async_trait;
use kodegen_tools_socialscrape::driver::DriverResult;
use kodegen_tools_socialscrape::extraction::TAB_SELECTOR;
use kodegen_tools_socialscrape::{
    AutomationDriver, DriverError, Element, ElementHandle, Job, JobId, JobOrchestrator,
    JobRequest, ScrapeConfig, ScrapeResult, SessionCookie, SessionLauncher,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const VALID_COOKIES: &str = r#"[
    {"name": "c_user", "value": "1000", "domain": ".facebook.com", "path": "/",
     "expires": -1, "httpOnly": false, "secure": true, "sameSite": "None"},
    {"name": "xs", "value": "secret", "domain": ".facebook.com", "path": "/",
     "expires": 1893456000, "httpOnly": true, "secure": true, "sameSite": "Lax"}
]"#;

/// One rendered DOM node
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    pub text: Option<String>,
    pub href: Option<String>,
    /// `href` of the permalink inside a post
    pub post_link: Option<String>,
    /// Every read fails, as for a node detached mid-scroll
    pub stale: bool,
}

impl MockNode {
    pub fn post(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn post_with_link(text: &str, link: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            post_link: Some(link.to_string()),
            ..Self::default()
        }
    }

    pub fn listing(title: &str, href: &str) -> Self {
        Self {
            text: Some(title.to_string()),
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    pub fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }
}

/// What the fake site renders
///
/// Each page is a list of batches; after `n` scrolls the first `n` batches
/// are rendered, the way an infinite feed keeps older items in the DOM.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub pages: HashMap<String, Vec<Vec<MockNode>>>,
    pub tabs: Vec<MockNode>,
    pub failing_urls: HashSet<String>,
    pub panic_on: Option<String>,
    pub reject_cookies: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, batches: Vec<Vec<MockNode>>) -> Self {
        self.pages.insert(url.to_string(), batches);
        self
    }

    pub fn tab(mut self, label: &str) -> Self {
        self.tabs.push(MockNode::post(label));
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    pub fn rejecting_cookies(mut self) -> Self {
        self.reject_cookies = true;
        self
    }
}

/// Observations shared by every session a launcher hands out
#[derive(Debug, Default)]
pub struct Recorder {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub clicks: AtomicUsize,
    pub navigations: Mutex<Vec<String>>,
    pub cookies: Mutex<Vec<SessionCookie>>,
}

impl Recorder {
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

pub struct MockDriver {
    script: Arc<Script>,
    recorder: Arc<Recorder>,
    current: Mutex<Option<String>>,
    scrolls: AtomicUsize,
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn set_cookies(&self, cookies: &[SessionCookie]) -> DriverResult<()> {
        if self.script.reject_cookies {
            return Err(DriverError::Cookies("cookie domain rejected".into()));
        }
        self.recorder.cookies.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }

    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>> {
        Ok(self.recorder.cookies.lock().unwrap().clone())
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.recorder.navigations.lock().unwrap().push(url.to_string());
        if self.script.panic_on.as_deref() == Some(url) {
            panic!("renderer crashed on {url}");
        }
        if self.script.failing_urls.contains(url) {
            return Err(DriverError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        self.scrolls.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<Option<String>> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn scroll_by(&self, _delta_y: i64) -> DriverResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        let nodes: Vec<MockNode> = if selector == TAB_SELECTOR {
            self.script.tabs.clone()
        } else {
            let current = self.current.lock().unwrap().clone();
            let scrolls = self.scrolls.load(Ordering::SeqCst);
            current
                .and_then(|url| self.script.pages.get(&url))
                .map(|batches| batches.iter().take(scrolls).flatten().cloned().collect())
                .unwrap_or_default()
        };

        Ok(nodes
            .into_iter()
            .map(|node| {
                Box::new(MockElement {
                    node,
                    recorder: Arc::clone(&self.recorder),
                }) as Element
            })
            .collect())
    }

    async fn wait(&self, _duration: Duration) {}

    async fn close(&self) -> DriverResult<()> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockElement {
    node: MockNode,
    recorder: Arc<Recorder>,
}

impl MockElement {
    fn check(&self) -> DriverResult<()> {
        if self.node.stale {
            Err(DriverError::Element("node is detached from the document".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ElementHandle for MockElement {
    async fn inner_text(&self) -> DriverResult<Option<String>> {
        self.check()?;
        Ok(self.node.text.clone())
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.check()?;
        Ok((name == "href").then(|| self.node.href.clone()).flatten())
    }

    async fn descendant_attribute(
        &self,
        _selector: &str,
        name: &str,
    ) -> DriverResult<Option<String>> {
        self.check()?;
        Ok((name == "href").then(|| self.node.post_link.clone()).flatten())
    }

    async fn click(&self) -> DriverResult<()> {
        self.check()?;
        self.recorder.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`MockDriver`]s over one script
pub struct MockLauncher {
    script: Arc<Script>,
    pub recorder: Arc<Recorder>,
    /// When set, `launch` blocks until notified
    pub gate: Option<Arc<Notify>>,
}

impl MockLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            recorder: Arc::new(Recorder::default()),
            gate: None,
        }
    }

    pub fn gated(script: Script, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(script)
        }
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self, _job_id: &JobId) -> ScrapeResult<Box<dyn AutomationDriver>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDriver {
            script: Arc::clone(&self.script),
            recorder: Arc::clone(&self.recorder),
            current: Mutex::new(None),
            scrolls: AtomicUsize::new(0),
        }))
    }
}

/// Config with no waits and no navigation retries
pub fn test_config(credential_dir: &Path) -> ScrapeConfig {
    ScrapeConfig::builder()
        .credential_dir(credential_dir)
        .settle_ms(0, 0)
        .navigation_retries(0)
        .group_max_scrolls(3)
        .marketplace_max_scrolls(3)
        .build()
        .unwrap()
}

/// Orchestrator over a fresh [`MockLauncher`]
pub fn orchestrator(credential_dir: &Path, script: Script) -> (JobOrchestrator, Arc<MockLauncher>) {
    let launcher = Arc::new(MockLauncher::new(script));
    let orchestrator = JobOrchestrator::new(test_config(credential_dir), launcher.clone());
    (orchestrator, launcher)
}

pub fn group_request(keywords: &str, groups: &[&str]) -> JobRequest {
    JobRequest {
        kind: kodegen_tools_socialscrape::JobKind::GroupSearch,
        keywords: keywords.to_string(),
        targets: groups.join("\n"),
        credentials: Some(VALID_COOKIES.as_bytes().to_vec()),
    }
}

pub fn marketplace_request(keywords: &str, zip_codes: &str) -> JobRequest {
    JobRequest {
        kind: kodegen_tools_socialscrape::JobKind::MarketplaceSearch,
        keywords: keywords.to_string(),
        targets: zip_codes.to_string(),
        credentials: Some(VALID_COOKIES.as_bytes().to_vec()),
    }
}

/// Wait (bounded) for a job to finish
pub async fn wait_terminal(orchestrator: &JobOrchestrator, id: &JobId) -> Job {
    tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.registry().wait_for_terminal(id),
    )
    .await
    .expect("job did not finish in time")
    .expect("job vanished from registry")
}
