//! Headless Chrome implementation of the browsing session.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::browser::{BrowserSession, PageHandle};
use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Chrome launch arguments matching the site's rendering quirks.
/// The detail frames are cross-origin, so site isolation must stay off.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--allow-running-insecure-content",
    "--disable-dev-shm-usage",
];

/// A Chrome browser session.
pub struct ChromeSession {
    browser: Browser,
    page_timeout: Duration,
}

impl ChromeSession {
    /// Launch a Chrome instance configured for crawling.
    pub fn launch(config: &CrawlerConfig) -> Result<Self> {
        let args: Vec<&OsStr> = LAUNCH_ARGS.iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .args(args)
            .build()
            .map_err(AppError::browser)?;

        let browser = Browser::new(options).map_err(AppError::browser)?;
        Ok(Self {
            browser,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
        })
    }
}

impl BrowserSession for ChromeSession {
    type Page = ChromeTab;

    fn new_page(&self) -> Result<ChromeTab> {
        let tab = self.browser.new_tab().map_err(AppError::browser)?;
        tab.set_default_timeout(self.page_timeout);
        Ok(ChromeTab { tab })
    }

    fn close(self) -> Result<()> {
        // The browser process is reaped when the handle drops.
        drop(self.browser);
        Ok(())
    }
}

/// One Chrome tab.
pub struct ChromeTab {
    tab: Arc<Tab>,
}

impl PageHandle for ChromeTab {
    fn goto(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url).map_err(AppError::browser)?;
        self.tab.wait_until_navigated().map_err(AppError::browser)?;
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content().map_err(AppError::browser)
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        let bytes = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(AppError::browser)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.tab.close(true).map_err(AppError::browser)?;
        Ok(())
    }
}
