//! Field extraction from listing and detail documents.
//!
//! Every field is located through an ordered chain of candidate selectors;
//! the first one yielding non-empty text wins. A missing field is an empty
//! string, never an error — only the absence of the detail section itself
//! fails the extraction for a page.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::JobPosting;
use crate::services::deadline;

/// Detail section wrapper. The class carries a per-render suffix, so only
/// the prefix is matched.
const DETAIL_SECTION: &str = r#"section[class^="jview"]"#;

/// Marker texts after which the salary column carries unrelated UI noise.
const SALARY_NOISE_MARKERS: [&str; 2] = ["상세보기", "최저임금"];

/// Map-widget label appended to the location column.
const LOCATION_MAP_LABEL: &str = "지도";

fn weekly_hours_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(주 \d+시간\)").expect("valid weekly-hours pattern"))
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collect an element's text with whitespace collapsed.
pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract posting links from a listing page document.
///
/// Returns hrefs as they appear on the page (usually root-relative), in
/// DOM order.
pub fn extract_links(document: &Html) -> Result<Vec<String>> {
    let item_sel = parse_selector(".box_item .notification_info a")?;

    let mut links = Vec::new();
    for link in document.select(&item_sel) {
        if let Some(href) = link.value().attr("href") {
            if !href.is_empty() {
                links.push(href.to_string());
            }
        }
    }
    Ok(links)
}

/// Extract a posting's structured fields from a detail page document.
///
/// Returns `None` when the detail section is absent from the page; every
/// other missing piece degrades to an empty field.
pub fn extract_posting(document: &Html, source_url: &str) -> Result<Option<JobPosting>> {
    let section_sel = parse_selector(DETAIL_SECTION)?;
    let Some(section) = document.select(&section_sel).next() else {
        return Ok(None);
    };

    let columns = column_map(&section)?;
    let mut posting = JobPosting::new(source_url);

    posting.company_name = first_text(
        &section,
        &[".title_inner .company", ".company_name", ".corp_name"],
    )?;
    posting.job_title = first_text(&section, &[".job_tit", "h1.tit_job"])?;

    posting.job_location = columns
        .get("근무지역")
        .map(|v| v.replace(LOCATION_MAP_LABEL, "").trim().to_string())
        .unwrap_or_default();

    posting.experience = column_fallback(&columns, &["경력", "경력조건"]);
    posting.salary = clean_salary(&column_fallback(&columns, &["급여", "급여조건"]));
    posting.employment_type = column_fallback(&columns, &["근무형태", "고용형태"]);
    posting.company_type = extract_company_type(&section)?;
    posting.deadline = deadline::extract_deadline(&section)?;

    Ok(Some(posting))
}

/// Evaluate a selector chain left to right; first non-empty text wins.
fn first_text(scope: &ElementRef, selectors: &[&str]) -> Result<String> {
    for raw in selectors {
        let sel = parse_selector(raw)?;
        if let Some(el) = scope.select(&sel).next() {
            let text = element_text(&el);
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }
    Ok(String::new())
}

/// Build a label → value map from the detail section's dl/dt/dd columns.
fn column_map(section: &ElementRef) -> Result<HashMap<String, String>> {
    let dl_sel = parse_selector("dl")?;
    let dt_sel = parse_selector("dt")?;
    let dd_sel = parse_selector("dd")?;

    let mut columns = HashMap::new();
    for dl in section.select(&dl_sel) {
        let title = dl.select(&dt_sel).next().map(|e| element_text(&e));
        let value = dl.select(&dd_sel).next().map(|e| element_text(&e));
        if let (Some(title), Some(value)) = (title, value) {
            if !title.is_empty() && !value.is_empty() {
                columns.insert(title, value);
            }
        }
    }
    Ok(columns)
}

fn column_fallback(columns: &HashMap<String, String>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| columns.get(*k))
        .cloned()
        .unwrap_or_default()
}

/// Strip trailing UI noise from the salary column.
///
/// The raw column text runs together with the detail-view link and the
/// minimum-wage notice; everything from the first marker on is dropped.
/// A trailing weekly-hours suffix like `(주 40시간)` ends the useful part.
fn clean_salary(raw: &str) -> String {
    let mut salary = raw;
    for marker in SALARY_NOISE_MARKERS {
        if let Some(idx) = salary.find(marker) {
            salary = &salary[..idx];
        }
    }
    let mut salary = salary.trim().to_string();

    if let Some(m) = weekly_hours_re().find(&salary) {
        salary.truncate(m.end());
    }
    salary.trim().to_string()
}

/// Extract the company form from the company-info panel.
///
/// The visible dd text may be truncated by the layout; the `title`
/// attribute carries the full value and is preferred.
fn extract_company_type(section: &ElementRef) -> Result<String> {
    let area_sel = parse_selector(".info_area")?;
    let dl_sel = parse_selector("dl")?;
    let dt_sel = parse_selector("dt")?;
    let dd_sel = parse_selector("dd")?;

    let Some(area) = section.select(&area_sel).next() else {
        return Ok(String::new());
    };

    for dl in area.select(&dl_sel) {
        let Some(dt) = dl.select(&dt_sel).next() else {
            continue;
        };
        if element_text(&dt) != "기업형태" {
            continue;
        }

        let Some(dd) = dl.select(&dd_sel).next() else {
            return Ok(String::new());
        };
        if let Some(title) = dd.value().attr("title") {
            if !title.is_empty() {
                return Ok(title.to_string());
            }
        }
        return Ok(element_text(&dd));
    }
    Ok(String::new())
}
