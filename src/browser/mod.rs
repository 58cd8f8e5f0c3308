//! Browsing session abstractions.
//!
//! The crawler only asks the browser for three things: navigate to a URL,
//! serialize the rendered document, and capture a screenshot. Everything
//! else (field extraction, link scanning) happens host-side over the
//! serialized content, so the pipeline can be exercised against fixture
//! pages without a real browser.

mod chrome;

use std::path::Path;

use crate::error::Result;

pub use chrome::{ChromeSession, ChromeTab};

/// One open page (tab) inside a browsing session.
///
/// Calls cross into the remote browser process and may fail there; failures
/// surface locally as `AppError::Browser` values.
pub trait PageHandle {
    /// Navigate to a URL and wait for the load to settle.
    fn goto(&self, url: &str) -> Result<()>;

    /// Serialize the rendered document to an HTML string.
    fn content(&self) -> Result<String>;

    /// Capture a full-page screenshot to the given path.
    fn screenshot(&self, path: &Path) -> Result<()>;

    /// Close the page.
    fn close(&self) -> Result<()>;
}

/// A running browser instance that can open pages.
pub trait BrowserSession {
    type Page: PageHandle;

    /// Open a fresh page in the session.
    fn new_page(&self) -> Result<Self::Page>;

    /// Shut the browser down. Consumes the session so it can only happen once.
    fn close(self) -> Result<()>;
}
