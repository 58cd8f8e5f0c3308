//! Storage abstractions for posting persistence.
//!
//! The store is insert-only: a posting is written once under its unique
//! `job_url` and never updated or deleted by the crawler. Duplicate
//! detection happens before insertion through one batched membership
//! check per listing page.

pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::JobPosting;

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Trait for posting storage backends.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Insert a newly collected posting. Returns the record id.
    async fn insert(&self, posting: &JobPosting) -> Result<i64>;

    /// Return the subset of `urls` that already exist in the store.
    ///
    /// Implementations must answer with a single batched query, not one
    /// lookup per URL.
    async fn find_existing_urls(&self, urls: &[String]) -> Result<HashSet<String>>;
}
