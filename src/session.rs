//! Browser session handle
//!
//! A [`BrowserSession`] owns one live Chromium instance for the duration of a
//! single recording or replay call. The handle is moved into the call that
//! uses it and released exactly once via [`BrowserSession::close`]; every
//! session gets its own throwaway profile directory so it never shares state
//! with a previous or concurrent session.

use anyhow::{Context, Result};
use colored::Colorize;
use playwright::api::{Browser, BrowserContext, ElementHandle, Page};
use playwright::Playwright;
use std::path::PathBuf;
use uuid::Uuid;

/// Options controlling how a session is launched.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub headless: bool,
    /// Explicit browser executable. Discovered from the system if not set.
    pub browser_path: Option<PathBuf>,
    /// Parent directory for per-session profile directories.
    pub user_data_root: Option<PathBuf>,
}

/// An exclusively-owned browser session.
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Playwright,
    browser: Browser,
    context: BrowserContext,
    page: Page,
    profile_dir: PathBuf,
}

impl BrowserSession {
    /// Launch a fresh, isolated browser session.
    ///
    /// Failure here is the only fatal error in the record/replay pipeline;
    /// everything after acquisition degrades per step.
    pub async fn launch(config: &SessionConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let chromium = playwright.chromium();
        let mut launcher = chromium.launcher().headless(config.headless);

        let executable = config.browser_path.clone().or_else(find_system_browser);
        if let Some(ref path) = executable {
            println!("{} Using browser: {}", "🌐".blue(), path.display());
            launcher = launcher.executable(path);
        } else {
            log::warn!("no system browser found, falling back to Playwright default");
        }

        let profile_root = config
            .user_data_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let profile_dir = profile_root.join(format!("flowpilot-profile-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&profile_dir)
            .with_context(|| format!("Failed to create profile dir {}", profile_dir.display()))?;

        let args: Vec<String> = vec![
            "--start-maximized".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-data-dir={}", profile_dir.display()),
        ];
        launcher = launcher.args(&args);

        let browser = launcher.launch().await.context("Failed to launch browser")?;
        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        log::debug!("session launched, profile at {}", profile_dir.display());

        Ok(Self {
            playwright,
            browser,
            context,
            page,
            profile_dir,
        })
    }

    /// Navigate the active page to a URL.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    /// Run a script on the active page, discarding the result.
    pub async fn inject(&self, script: &str) -> Result<()> {
        self.page.evaluate::<(), ()>(script, ()).await?;
        Ok(())
    }

    /// Run a script on the active page and deserialize its JSON result.
    pub async fn eval_json(&self, script: &str) -> Result<serde_json::Value> {
        let value: serde_json::Value = self.page.evaluate(script, ()).await?;
        Ok(value)
    }

    /// URL of the active document.
    pub async fn current_url(&self) -> Result<String> {
        let url: String = self
            .page
            .evaluate("() => window.location.href", ())
            .await?;
        Ok(url)
    }

    /// All pages currently open in this session's context, in open order.
    pub fn pages(&self) -> Vec<Page> {
        self.context.pages().unwrap_or_default()
    }

    /// Make `page` the active page for subsequent calls.
    pub async fn activate(&mut self, page: Page) {
        page.bring_to_front().await.ok();
        self.page = page;
    }

    /// Wait up to `timeout_ms` for `selector` to match an interactable
    /// element on the active page. `None` means the wait timed out.
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<Option<ElementHandle>> {
        let ready = self
            .page
            .wait_for_selector_builder(selector)
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await;
        if ready.is_err() {
            return Ok(None);
        }
        Ok(self.page.query_selector(selector).await?)
    }

    /// Scroll by `delta` units relative to an element.
    pub async fn scroll_element(&self, element: ElementHandle, delta: f64) -> Result<()> {
        let js = format!("el => el.scrollBy(0, {})", delta);
        self.page.evaluate::<_, ()>(&js, element).await?;
        Ok(())
    }

    /// Release the session: close the browser and remove the profile
    /// directory. Close errors are swallowed; a browser the operator
    /// already closed cannot be closed again.
    pub async fn close(self) {
        self.browser.close().await.ok();
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            log::debug!(
                "could not remove profile dir {}: {}",
                self.profile_dir.display(),
                e
            );
        }
    }
}

/// Locate a Chromium-based browser on this machine.
///
/// Checks `PATH` first, then well-known install locations.
fn find_system_browser() -> Option<PathBuf> {
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "msedge"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];
    common_paths
        .iter()
        .map(std::path::Path::new)
        .find(|p| p.exists())
        .map(|p| p.to_path_buf())
}
