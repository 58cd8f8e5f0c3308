// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod posting;
mod state;

// Re-export all public types
pub use config::{Config, CrawlerConfig, OcrConfig, SiteConfig, StorageConfig};
pub use posting::{DescriptionSource, JobPosting};
pub use state::CrawlState;
