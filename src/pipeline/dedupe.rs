//! Duplicate gate: decides which links are new and when to stop paging.

use std::collections::HashSet;

use crate::models::CrawlState;

/// A listing page only counts toward halting when it carries at least this
/// many links. A temporarily thin or empty results page must not be able
/// to stop a long crawl.
pub const MIN_DUPLICATE_PAGE_SIZE: usize = 5;

/// Consecutive fully-duplicate pages required before the crawl halts.
pub const HALT_AFTER_PAGES: u32 = 3;

/// Result of gating one listing page's candidate URLs.
#[derive(Debug)]
pub struct GateOutcome {
    /// Candidates not yet in the store, in page order
    pub new_urls: Vec<String>,

    /// How many candidates were already stored
    pub duplicate_count: usize,
}

/// Gate a page of candidate URLs against the already-stored set.
///
/// A page on which every candidate is a duplicate (and which meets the
/// minimum size) bumps the run's consecutive-duplicate counter; the
/// counter reaching [`HALT_AFTER_PAGES`] requests a halt. Any other page
/// resets the counter.
pub fn assess(
    state: &mut CrawlState,
    candidates: &[String],
    existing: &HashSet<String>,
) -> GateOutcome {
    let duplicate_count = candidates.iter().filter(|u| existing.contains(*u)).count();

    if duplicate_count >= MIN_DUPLICATE_PAGE_SIZE && duplicate_count == candidates.len() {
        state.consecutive_duplicate_pages += 1;
        log::warn!(
            "All {} posting(s) on this page were already collected ({} consecutive page(s))",
            duplicate_count,
            state.consecutive_duplicate_pages
        );
        if state.consecutive_duplicate_pages >= HALT_AFTER_PAGES {
            state.request_halt();
        }
    } else {
        state.consecutive_duplicate_pages = 0;
    }

    let new_urls = candidates
        .iter()
        .filter(|u| !existing.contains(*u))
        .cloned()
        .collect();

    GateOutcome {
        new_urls,
        duplicate_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("https://example.com/job/{i}"))
            .collect()
    }

    fn as_set(urls: &[String]) -> HashSet<String> {
        urls.iter().cloned().collect()
    }

    #[test]
    fn test_fully_duplicate_page_increments_counter() {
        let mut state = CrawlState::new();
        let candidates = urls(5);
        let outcome = assess(&mut state, &candidates, &as_set(&candidates));

        assert_eq!(outcome.duplicate_count, 5);
        assert!(outcome.new_urls.is_empty());
        assert_eq!(state.consecutive_duplicate_pages, 1);
        assert!(!state.halt_requested());
    }

    #[test]
    fn test_halt_on_third_consecutive_page_not_earlier() {
        let mut state = CrawlState::new();
        let candidates = urls(6);
        let existing = as_set(&candidates);

        assess(&mut state, &candidates, &existing);
        assert!(!state.halt_requested());
        assess(&mut state, &candidates, &existing);
        assert!(!state.halt_requested());
        assess(&mut state, &candidates, &existing);
        assert!(state.halt_requested());
    }

    #[test]
    fn test_intervening_fresh_page_resets_counter() {
        let mut state = CrawlState::new();
        let candidates = urls(6);
        let existing = as_set(&candidates);

        assess(&mut state, &candidates, &existing);
        assess(&mut state, &candidates, &existing);
        assert_eq!(state.consecutive_duplicate_pages, 2);

        // One page with a single new link resets the streak.
        let mut partial = existing.clone();
        partial.remove(&candidates[0]);
        let outcome = assess(&mut state, &candidates, &partial);
        assert_eq!(state.consecutive_duplicate_pages, 0);
        assert_eq!(outcome.new_urls, vec![candidates[0].clone()]);

        assess(&mut state, &candidates, &existing);
        assert_eq!(state.consecutive_duplicate_pages, 1);
        assert!(!state.halt_requested());
    }

    #[test]
    fn test_small_page_never_counts_even_if_fully_duplicate() {
        let mut state = CrawlState::new();
        let candidates = urls(4);
        let existing = as_set(&candidates);

        for _ in 0..5 {
            let outcome = assess(&mut state, &candidates, &existing);
            assert_eq!(outcome.duplicate_count, 4);
            assert!(outcome.new_urls.is_empty());
        }
        assert_eq!(state.consecutive_duplicate_pages, 0);
        assert!(!state.halt_requested());
    }

    #[test]
    fn test_empty_page_resets_counter() {
        let mut state = CrawlState::new();
        let candidates = urls(5);
        let existing = as_set(&candidates);

        assess(&mut state, &candidates, &existing);
        assert_eq!(state.consecutive_duplicate_pages, 1);

        assess(&mut state, &[], &HashSet::new());
        assert_eq!(state.consecutive_duplicate_pages, 0);
    }

    #[test]
    fn test_new_urls_preserve_page_order() {
        let mut state = CrawlState::new();
        let candidates = urls(6);
        let mut existing = HashSet::new();
        existing.insert(candidates[1].clone());
        existing.insert(candidates[3].clone());

        let outcome = assess(&mut state, &candidates, &existing);
        assert_eq!(
            outcome.new_urls,
            vec![
                candidates[0].clone(),
                candidates[2].clone(),
                candidates[4].clone(),
                candidates[5].clone(),
            ]
        );
    }
}
