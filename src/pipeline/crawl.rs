// src/pipeline/crawl.rs

//! Posting crawl pipeline.
//!
//! Owns the page-range loop: listing navigation, duplicate gating, detail
//! extraction, description resolution and persistence. Errors are scoped
//! to the page or posting they occurred on; a run always returns whatever
//! it managed to collect, and the browser session is closed exactly once.

use std::time::{Duration, Instant};

use rand::Rng;
use scraper::Html;

use crate::browser::{BrowserSession, PageHandle};
use crate::error::Result;
use crate::models::{Config, CrawlState, CrawlerConfig, JobPosting};
use crate::pipeline::dedupe;
use crate::services::extractor;
use crate::services::{DescriptionResolver, OcrProvider, RunSummary};
use crate::storage::PostingStore;

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Newly collected postings, in the order they were encountered
    pub postings: Vec<JobPosting>,
    pub pages_processed: u32,
    pub page_failures: u32,
    pub posting_failures: u32,
    /// Whether the duplicate gate stopped the run before the last page
    pub halted_early: bool,
}

/// Run the posting crawler over the configured page range.
///
/// Returns partial results on failure; never propagates an error to the
/// caller.
pub async fn run_crawler<S: BrowserSession>(
    config: &Config,
    session: S,
    store: &dyn PostingStore,
    ocr: &dyn OcrProvider,
) -> CrawlOutcome {
    let started = Instant::now();
    log::info!(
        "Starting crawl: pages {} to {} (headless={}, wait={}..{}ms)",
        config.crawler.start_page,
        config.crawler.end_page,
        config.crawler.headless,
        config.crawler.wait_min_ms,
        config.crawler.wait_max_ms,
    );

    let mut outcome = CrawlOutcome::default();

    match session.new_page() {
        Ok(page) => {
            let mut state = CrawlState::new();
            run_pages(
                config,
                &session,
                &page,
                store,
                ocr,
                &mut state,
                &mut outcome,
            )
            .await;
            outcome.halted_early = state.halt_requested();

            if let Err(e) = page.close() {
                log::debug!("Failed to close the crawl page: {}", e);
            }
        }
        Err(e) => log::error!("Failed to open a browser page: {}", e),
    }

    RunSummary::from_postings(&outcome.postings).log();
    log::info!(
        "Crawl finished in {:.2}s ({} page(s), {} page failure(s), {} posting failure(s))",
        started.elapsed().as_secs_f64(),
        outcome.pages_processed,
        outcome.page_failures,
        outcome.posting_failures,
    );

    if let Err(e) = session.close() {
        log::warn!("Failed to shut the browser down: {}", e);
    }

    outcome
}

/// The page loop. Halt is only checked here, at page boundaries: a page
/// already in progress always completes (or fails) first.
async fn run_pages<S: BrowserSession>(
    config: &Config,
    session: &S,
    page: &S::Page,
    store: &dyn PostingStore,
    ocr: &dyn OcrProvider,
    state: &mut CrawlState,
    outcome: &mut CrawlOutcome,
) {
    for page_num in config.crawler.start_page..=config.crawler.end_page {
        if state.halt_requested() {
            log::warn!(
                "Only duplicate postings on recent pages; halting before page {}",
                page_num
            );
            break;
        }

        state.current_page = page_num;
        log::info!("Scraping listing page {}...", page_num);

        match process_page(config, session, page, store, ocr, state, outcome, page_num).await {
            Ok(collected) => {
                outcome.pages_processed += 1;
                log::info!("Page {} done: {} new posting(s)", page_num, collected);
            }
            Err(e) => {
                outcome.page_failures += 1;
                log::error!("Failed to process page {}: {}", page_num, e);
            }
        }
    }
}

/// Process one listing page: gate its links and collect the new postings.
#[allow(clippy::too_many_arguments)]
async fn process_page<S: BrowserSession>(
    config: &Config,
    session: &S,
    page: &S::Page,
    store: &dyn PostingStore,
    ocr: &dyn OcrProvider,
    state: &mut CrawlState,
    outcome: &mut CrawlOutcome,
    page_num: u32,
) -> Result<usize> {
    let list_url = config.site.list_url(page_num);
    page.goto(&list_url)?;
    settle_delay(&config.crawler).await;

    let links = {
        let html = page.content()?;
        extractor::extract_links(&Html::parse_document(&html))?
    };
    log::info!("Page {}: found {} posting link(s)", page_num, links.len());

    let candidates: Vec<String> = links
        .iter()
        .map(|href| config.site.absolutize(href))
        .collect();
    let existing = store.find_existing_urls(&candidates).await?;

    let gate = dedupe::assess(state, &candidates, &existing);
    if gate.duplicate_count > 0 {
        log::info!(
            "Page {}: skipping {} already-collected posting(s)",
            page_num,
            gate.duplicate_count
        );
    }
    if state.halt_requested() {
        return Ok(0);
    }

    let resolver = DescriptionResolver::new(session, ocr, config);
    let mut collected = 0;
    for url in &gate.new_urls {
        match process_posting(config, page, &resolver, store, url).await {
            Ok(Some(posting)) => {
                outcome.postings.push(posting);
                collected += 1;
            }
            Ok(None) => log::warn!("No detail section found at {}", url),
            Err(e) => {
                outcome.posting_failures += 1;
                log::error!("Failed to collect posting {} (page {}): {}", url, page_num, e);
            }
        }
    }
    Ok(collected)
}

/// Visit one detail page, extract its fields and description, and persist
/// the posting.
async fn process_posting<S: BrowserSession>(
    config: &Config,
    page: &S::Page,
    resolver: &DescriptionResolver<'_, S>,
    store: &dyn PostingStore,
    url: &str,
) -> Result<Option<JobPosting>> {
    log::info!("Collecting posting details: {}", url);
    page.goto(url)?;
    // Re-rolled per detail visit to avoid a detectable request cadence.
    settle_delay(&config.crawler).await;

    let html = page.content()?;
    let extracted = {
        let document = Html::parse_document(&html);
        extractor::extract_posting(&document, url)?
    };
    let Some(mut posting) = extracted else {
        return Ok(None);
    };

    match resolver.resolve(&html).await {
        Some(result) => {
            posting.description_source = result.description_source();
            posting.description = result.content;
        }
        None => log::info!("No detail content available for {}", url),
    }

    store.insert(&posting).await?;
    log::info!(
        "Stored posting: {} | {} | {} | {} [{}]",
        posting.company_name,
        posting.job_title,
        posting.experience,
        posting.deadline,
        posting.description_source.as_str(),
    );
    Ok(Some(posting))
}

/// Sleep for a random interval inside the configured settle window.
async fn settle_delay(crawler: &CrawlerConfig) {
    let ms = { rand::thread_rng().gen_range(crawler.wait_min_ms..=crawler.wait_max_ms) };
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
