//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Target site settings
    #[serde(default)]
    pub site: SiteConfig,

    /// OCR provider settings
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.start_page == 0 {
            return Err(AppError::validation("crawler.start_page must be >= 1"));
        }
        if self.crawler.end_page < self.crawler.start_page {
            return Err(AppError::validation(
                "crawler.end_page must be >= crawler.start_page",
            ));
        }
        if self.crawler.wait_max_ms < self.crawler.wait_min_ms {
            return Err(AppError::validation(
                "crawler.wait_max_ms must be >= crawler.wait_min_ms",
            ));
        }
        if self.crawler.page_timeout_secs == 0 {
            return Err(AppError::validation("crawler.page_timeout_secs must be > 0"));
        }
        if self.site.origin.trim().is_empty() {
            return Err(AppError::validation("site.origin is empty"));
        }
        if !self.site.list_path.contains("{page}") {
            return Err(AppError::validation(
                "site.list_path must contain a {page} placeholder",
            ));
        }
        if self.ocr.model.trim().is_empty() {
            return Err(AppError::validation("ocr.model is empty"));
        }
        Ok(())
    }
}

/// Crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page number (inclusive)
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Last listing page number (inclusive)
    #[serde(default = "defaults::end_page")]
    pub end_page: u32,

    /// Run the browser without a visible window
    #[serde(default)]
    pub headless: bool,

    /// Lower bound of the post-navigation settle delay in milliseconds
    #[serde(default = "defaults::wait_min_ms")]
    pub wait_min_ms: u64,

    /// Upper bound of the post-navigation settle delay in milliseconds
    #[serde(default = "defaults::wait_max_ms")]
    pub wait_max_ms: u64,

    /// Settle delay after navigating an embedded detail frame
    #[serde(default = "defaults::iframe_settle_ms")]
    pub iframe_settle_ms: u64,

    /// Per-navigation timeout in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_page: defaults::start_page(),
            end_page: defaults::end_page(),
            headless: false,
            wait_min_ms: defaults::wait_min_ms(),
            wait_max_ms: defaults::wait_max_ms(),
            iframe_settle_ms: defaults::iframe_settle_ms(),
            page_timeout_secs: defaults::page_timeout(),
        }
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site origin used to absolutize relative links
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// Listing page path template; `{page}` is replaced by the page number
    #[serde(default = "defaults::list_path")]
    pub list_path: String,
}

impl SiteConfig {
    /// Build the full listing URL for a page number.
    pub fn list_url(&self, page: u32) -> String {
        format!(
            "{}{}",
            self.origin,
            self.list_path.replace("{page}", &page.to_string())
        )
    }

    /// Absolutize a listing link against the site origin.
    pub fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.origin, href)
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: defaults::origin(),
            list_path: defaults::list_path(),
        }
    }
}

/// OCR provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// OCR API endpoint
    #[serde(default = "defaults::ocr_endpoint")]
    pub endpoint: String,

    /// OCR model identifier
    #[serde(default = "defaults::ocr_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::ocr_api_key_env")]
    pub api_key_env: String,

    /// Return recognized image text instead of frame body text when an
    /// image-bearing frame yields both
    #[serde(default)]
    pub ocr_preferred: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::ocr_endpoint(),
            model: defaults::ocr_model(),
            api_key_env: defaults::ocr_api_key_env(),
            ocr_preferred: false,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path
    #[serde(default = "defaults::db_path")]
    pub db_path: String,

    /// Scratch directory for screenshot temp files
    #[serde(default = "defaults::work_dir")]
    pub work_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
            work_dir: defaults::work_dir(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn start_page() -> u32 {
        1
    }
    pub fn end_page() -> u32 {
        20
    }
    pub fn wait_min_ms() -> u64 {
        4000
    }
    pub fn wait_max_ms() -> u64 {
        6000
    }
    pub fn iframe_settle_ms() -> u64 {
        2000
    }
    pub fn page_timeout() -> u64 {
        30
    }

    // Site defaults
    pub fn origin() -> String {
        "https://www.saramin.co.kr".into()
    }
    pub fn list_path() -> String {
        concat!(
            "/zf_user/jobs/list/domestic?page={page}",
            "&loc_mcd=101000%2C102000",
            "&cat_kewd=2248%2C82%2C83%2C107%2C108%2C109%2C116%2C106%2C105%2C2239%2C80%2C81",
            "&edu_none=y&edu_min=8&edu_max=12",
            "&search_optional_item=y&search_done=y&panel_count=y&preview=y",
            "&isAjaxRequest=0&page_count=50&sort=RL&type=domestic&is_param=1",
            "&isSearchResultEmpty=1&isSectionHome=0&searchParamCount=5#searchTitle"
        )
        .into()
    }

    // OCR defaults
    pub fn ocr_endpoint() -> String {
        "https://api.mistral.ai/v1/ocr".into()
    }
    pub fn ocr_model() -> String {
        "mistral-ocr-latest".into()
    }
    pub fn ocr_api_key_env() -> String {
        "MISTRAL_API_KEY".into()
    }

    // Storage defaults
    pub fn db_path() -> String {
        "data/postings.sqlite".into()
    }
    pub fn work_dir() -> String {
        "temp".into()
    }
}
