//! Job posting data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the detail description of a posting was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionSource {
    /// No detail content could be resolved
    #[default]
    None,
    /// Plain text read from the page or its embedded frame
    Text,
    /// Text recognized from posting images
    Ocr,
}

impl DescriptionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionSource::None => "none",
            DescriptionSource::Text => "text",
            DescriptionSource::Ocr => "ocr",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "text" => DescriptionSource::Text,
            "ocr" => DescriptionSource::Ocr,
            _ => DescriptionSource::None,
        }
    }
}

/// A job posting scraped from a detail page.
///
/// Every text field is an empty string when the page did not carry the
/// information; fields are never null. `source_url` is the sole
/// deduplication key: postings are inserted once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPosting {
    /// Company name
    pub company_name: String,

    /// Posting title
    pub job_title: String,

    /// Workplace location (map-widget label stripped)
    pub job_location: String,

    /// Experience requirement (e.g. "신입", "경력 3년")
    pub experience: String,

    /// Salary text (noise markers truncated)
    pub salary: String,

    /// Application deadline text (empty for rolling deadlines)
    pub deadline: String,

    /// Employment type (e.g. "정규직", "계약직")
    pub employment_type: String,

    /// Company form (e.g. "대기업", "중소기업")
    pub company_type: String,

    /// Full URL of the posting detail page; unique key
    pub source_url: String,

    /// Free-text detail content, possibly OCR-derived
    pub description: String,

    /// Provenance of `description`
    pub description_source: DescriptionSource,

    /// When the posting was collected
    pub scraped_at: DateTime<Utc>,
}

impl JobPosting {
    /// Create an empty posting for the given source URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            company_name: String::new(),
            job_title: String::new(),
            job_location: String::new(),
            experience: String::new(),
            salary: String::new(),
            deadline: String::new(),
            employment_type: String::new(),
            company_type: String::new(),
            source_url: source_url.into(),
            description: String::new(),
            description_source: DescriptionSource::None,
            scraped_at: Utc::now(),
        }
    }
}
