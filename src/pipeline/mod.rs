//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl listing pages and collect new postings
//! - `dedupe`: Duplicate gating and halt heuristics

pub mod crawl;
pub mod dedupe;

pub use crawl::{CrawlOutcome, run_crawler};
