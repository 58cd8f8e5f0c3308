//! Deadline extraction heuristics.
//!
//! Postings carry their application period in one of two places: a
//! dedicated period widget, or free text somewhere in the detail section.
//! Open-ended postings carry neither; that is a normal outcome, not an
//! error, and yields an empty string.

use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use crate::error::Result;
use crate::services::extractor::{element_text, parse_selector};

/// Free-text labels that introduce a deadline or application period.
const DEADLINE_KEYWORDS: [&str; 4] = ["마감일", "접수기간", "모집기간", "공고기간"];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}[-./]\d{1,2}[-./]\d{1,2}").expect("valid date pattern"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}:\d{2}").expect("valid time pattern"))
}

/// Extract the deadline text from a detail section.
pub fn extract_deadline(section: &ElementRef) -> Result<String> {
    if let Some(deadline) = widget_deadline(section)? {
        if !deadline.is_empty() {
            return Ok(deadline);
        }
    }
    scan_deadline(section)
}

/// Dedicated period widget: the dd immediately following the deadline dt.
fn widget_deadline(section: &ElementRef) -> Result<Option<String>> {
    let period_sel = parse_selector(".info_period")?;
    let end_sel = parse_selector("dt.end")?;

    let Some(period) = section.select(&period_sel).next() else {
        return Ok(None);
    };
    let Some(end_dt) = period.select(&end_sel).next() else {
        return Ok(None);
    };
    if !element_text(&end_dt).contains("마감일") {
        return Ok(None);
    }

    let next_dd = end_dt
        .next_siblings()
        .find_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "dd");
    Ok(next_dd.map(|dd| element_text(&dd)))
}

/// Fallback: scan every descendant for a deadline keyword, then pull a
/// date (and co-occurring time) out of that node's text.
fn scan_deadline(section: &ElementRef) -> Result<String> {
    let any_sel = parse_selector("*")?;

    for el in section.select(&any_sel) {
        let text = element_text(&el);
        if !DEADLINE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            continue;
        }

        if let Some(date) = date_re().find(&text) {
            return Ok(match time_re().find(&text) {
                Some(time) => format!("{} {}", date.as_str(), time.as_str()),
                None => date.as_str().to_string(),
            });
        }
    }
    Ok(String::new())
}
