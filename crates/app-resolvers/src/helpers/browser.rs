//! Thin wrapper around a headless Chromium session.
//!
//! Page layouts on the hosting sites change without notice, so the
//! selectors here are expected to break now and then. Keeping all the
//! browser plumbing in one place means layout breakage stays inside
//! the resolver that owns the selector.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use chromiumoxide::{
    cdp::browser_protocol::browser::{SetDownloadBehaviorBehavior, SetDownloadBehaviorParams},
    page::ScreenshotParams,
    Browser, BrowserConfig, Element, Page,
};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ResolverError;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a fresh headless browser.
    ///
    /// When `download_dir` is given, files the page downloads are
    /// dropped there instead of being prompted for.
    pub async fn launch(download_dir: Option<&Path>) -> Result<Self, ResolverError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--incognito")
            .build()
            .map_err(ResolverError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(ResolverError::browser)?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(ResolverError::browser)?;

        if let Some(dir) = download_dir {
            let params = SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(dir.to_string_lossy().to_string())
                .build()
                .map_err(ResolverError::Browser)?;

            page.execute(params).await.map_err(ResolverError::browser)?;
        }

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub async fn goto(&self, url: &str) -> Result<(), ResolverError> {
        debug!(url, "Navigating");

        self.page.goto(url).await.map_err(ResolverError::browser)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(ResolverError::browser)?;

        Ok(())
    }

    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Poll for an element until it appears or the budget runs out.
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element, ResolverError> {
        let started = Instant::now();

        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }

            if started.elapsed() >= timeout {
                debug!(selector, "Element never appeared");
                return Err(ResolverError::Timeout(timeout));
            }

            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    /// Diagnostic screenshot, best-effort.
    pub async fn save_screenshot(&self, path: &Path) {
        match self
            .page
            .save_screenshot(ScreenshotParams::builder().build(), path)
            .await
        {
            Ok(_) => info!(?path, "Saved debugging screenshot"),
            Err(e) => debug!("Failed to save screenshot: {e}"),
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Failed to close browser: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}
