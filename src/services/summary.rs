//! Run summary aggregation.

use std::collections::HashMap;

use crate::models::JobPosting;

/// Bucket label for postings that left a field empty.
const UNSPECIFIED: &str = "미지정";

/// How many top companies the summary lists.
const TOP_COMPANIES: usize = 5;

/// Aggregated counts for one crawl run. Diagnostic output only; the
/// structured return value of a run is the posting list itself.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Total collected postings
    pub total: usize,

    /// Top companies by posting count, descending
    pub top_companies: Vec<(String, usize)>,

    /// Posting counts per experience requirement
    pub by_experience: Vec<(String, usize)>,

    /// Posting counts per employment type
    pub by_employment_type: Vec<(String, usize)>,
}

impl RunSummary {
    /// Aggregate a run's collected postings.
    pub fn from_postings(postings: &[JobPosting]) -> Self {
        let mut by_company = count_by(postings, |p| &p.company_name);
        by_company.truncate(TOP_COMPANIES);

        Self {
            total: postings.len(),
            top_companies: by_company,
            by_experience: count_by(postings, |p| &p.experience),
            by_employment_type: count_by(postings, |p| &p.employment_type),
        }
    }

    /// Emit the summary through the log output.
    pub fn log(&self) {
        log::info!("Collected {} posting(s) this run", self.total);

        if !self.top_companies.is_empty() {
            log::info!("Top companies:");
            for (rank, (company, count)) in self.top_companies.iter().enumerate() {
                log::info!("  {}. {}: {}", rank + 1, company, count);
            }
        }

        log::info!("Postings by experience requirement:");
        for (bucket, count) in &self.by_experience {
            log::info!("  - {}: {}", bucket, count);
        }

        log::info!("Postings by employment type:");
        for (bucket, count) in &self.by_employment_type {
            log::info!("  - {}: {}", bucket, count);
        }
    }
}

/// Count postings per bucket; empty fields land in the unspecified bucket.
/// Sorted by descending count, then bucket name for a stable order.
fn count_by<'a>(
    postings: &'a [JobPosting],
    key: impl Fn(&'a JobPosting) -> &'a str,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for posting in postings {
        let bucket = match key(posting) {
            "" => UNSPECIFIED,
            other => other,
        };
        *counts.entry(bucket).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}
