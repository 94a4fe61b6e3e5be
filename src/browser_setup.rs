//! Chrome discovery and launch
//!
//! Finds a local Chrome/Chromium (or downloads a managed one) and starts it
//! with the stealth flags the scraped surface expects from a real desktop
//! browser.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::utils::constants::CHROME_USER_AGENT;

/// Well-known install locations for the current platform
fn candidate_paths() -> Vec<PathBuf> {
    let raw: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"%PROGRAMFILES%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES(X86)%\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES%\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    raw.iter()
        .filter_map(|p| {
            if let Some(rest) = p.strip_prefix("~/") {
                dirs::home_dir().map(|home| home.join(rest))
            } else if p.contains('%') {
                Some(PathBuf::from(expand_windows_env_vars(p)))
            } else {
                Some(PathBuf::from(p))
            }
        })
        .collect()
}

/// Find Chrome/Chromium executable on the system
///
/// An explicit path from `ScrapeConfig` wins, then `CHROMIUM_PATH`, then the
/// usual install locations, then `which`.
pub async fn find_browser_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    let overrides = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::env::var_os("CHROMIUM_PATH").map(PathBuf::from));

    for path in overrides {
        if path.exists() {
            info!("Using browser override: {}", path.display());
            return Ok(path);
        }
        warn!("Browser override points to non-existent file: {}", path.display());
    }

    if let Some(path) = candidate_paths().into_iter().find(|p| p.exists()) {
        info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {found}");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found. Will download and use fetcher.");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Expand `%VAR%` tokens in a Windows path
///
/// Unknown variables and unterminated tokens are kept verbatim; `%%` collapses
/// to a single `%`.
///
/// ```text
/// %PROGRAMFILES%\Google\Chrome\Application\chrome.exe
///   -> C:\Program Files\Google\Chrome\Application\chrome.exe
/// ```
fn expand_windows_env_vars(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(0) => {
                out.push('%');
                rest = &after[1..];
            }
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                out.push_str(after);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Downloads and manages Chromium browser if not found locally.
/// Returns a path to the downloaded executable.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .map(|dir| dir.join("kodegen").join("socialscrape"))
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir().join("socialscrape_chrome_cache");
            warn!(
                "Could not determine cache directory, using temp directory fallback: {}",
                fallback.display()
            );
            fallback
        })
        .join("chromium");

    std::fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Launch a stealth-configured browser on the given profile directory
///
/// Returns the browser and its CDP handler task. The handler MUST be aborted
/// once the browser is done with, otherwise it outlives the process.
pub async fn launch_browser(
    headless: bool,
    executable: Option<&Path>,
    user_data_dir: &Path,
) -> Result<(Browser, JoinHandle<()>)> {
    let chrome_path = match find_browser_executable(executable).await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1920, 1080)
        .user_data_dir(user_data_dir)
        .chrome_executable(chrome_path);

    if headless {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    config_builder = config_builder
        .arg(format!("--user-agent={CHROME_USER_AGENT}"))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--disable-desktop-notifications")
        .arg("--disable-setuid-sandbox")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-timer-throttling")
        .arg("--disable-backgrounding-occluded-windows")
        .arg("--disable-features=TranslateUI")
        .arg("--disable-hang-monitor")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain")
        .arg("--mute-audio");

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser with profile {}", user_data_dir.display());
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome emits CDP events chromiumoxide has no variant for
                // https://github.com/mattsse/chromiumoxide/issues/167
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!("Suppressed benign CDP serialization error: {}", error_msg);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok((browser, handler_task))
}

/// Hide the most obvious automation fingerprints
///
/// Must run on the blank page before the first navigation.
pub async fn apply_stealth_measures(page: &chromiumoxide::Page) -> Result<()> {
    let webdriver_js = r"
        Object.defineProperty(navigator, 'webdriver', {
            get: () => false
        });
    ";
    page.evaluate(webdriver_js).await?;

    let languages_js = r"
        Object.defineProperty(navigator, 'languages', {
            get: () => ['en-US', 'en']
        });
    ";
    page.evaluate(languages_js).await?;

    let chrome_runtime_js = r"
        if (!window.chrome) {
            window.chrome = {};
        }
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => ({
                    onMessage: { addListener: () => {}, removeListener: () => {} },
                    postMessage: () => {}
                })
            };
        }
    ";
    page.evaluate(chrome_runtime_js).await?;

    trace!("Applied stealth measures");
    Ok(())
}
