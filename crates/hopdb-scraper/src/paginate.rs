//! Early-stop bookkeeping shared by every shop scraper.

use std::collections::HashSet;

use hopdb_core::{CancelFlag, StockStatus};

/// Consecutive already-known URLs before a new-only scrape stops.
pub const KNOWN_URL_STOP: u32 = 30;

/// Per-call options for one shop scraper.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Cap on items returned by this scraper.
    pub limit: Option<usize>,
    /// When present, enables new-only mode: stop after [`KNOWN_URL_STOP`]
    /// consecutive URLs found in this set.
    pub known_urls: Option<HashSet<String>>,
    /// Disables both early stops and walks every page.
    pub full_scrape: bool,
    /// Consecutive sold-out items before stopping (ignored in new-only mode).
    pub sold_out_threshold: u32,
    /// Pages fetched concurrently by scrapers that paginate in batches.
    pub page_batch: usize,
    /// Polled between pages and items; a set flag ends pagination early
    /// with whatever was collected so far.
    pub cancel: CancelFlag,
}

impl ScrapeOptions {
    /// True once `count` items have been collected under the configured limit.
    pub(crate) fn limit_reached(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| count >= limit)
    }

    /// True when pagination should wind down: limit hit or cancellation
    /// requested.
    pub(crate) fn should_stop(&self, count: usize) -> bool {
        self.cancel.is_cancelled() || self.limit_reached(count)
    }

    pub(crate) fn is_known(&self, url: &str) -> bool {
        self.known_urls
            .as_ref()
            .is_some_and(|urls| urls.contains(url))
    }
}

/// Tracks consecutive sold-out listings. Active only on a default scrape:
/// a full scrape walks everything, and new-only mode replaces this heuristic
/// with the known-URL tracker.
#[derive(Debug)]
pub(crate) struct SoldOutTracker {
    threshold: u32,
    streak: u32,
    enabled: bool,
}

impl SoldOutTracker {
    pub(crate) fn new(opts: &ScrapeOptions) -> Self {
        Self {
            threshold: opts.sold_out_threshold,
            streak: 0,
            enabled: !opts.full_scrape && opts.known_urls.is_none(),
        }
    }

    /// Records one listing's status; returns `true` when the streak reaches
    /// the threshold and pagination should stop.
    pub(crate) fn observe(&mut self, status: StockStatus) -> bool {
        if !self.enabled {
            return false;
        }
        if status == StockStatus::SoldOut {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak >= self.threshold
    }
}

/// Tracks consecutive already-known URLs in new-only mode.
#[derive(Debug)]
pub(crate) struct KnownUrlTracker {
    streak: u32,
    enabled: bool,
}

impl KnownUrlTracker {
    pub(crate) fn new(opts: &ScrapeOptions) -> Self {
        Self {
            streak: 0,
            enabled: opts.known_urls.is_some() && !opts.full_scrape,
        }
    }

    /// Records whether one listing's URL was already known; returns `true`
    /// when the scraper should stop.
    pub(crate) fn observe(&mut self, known: bool) -> bool {
        if !self.enabled {
            return false;
        }
        if known {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak >= KNOWN_URL_STOP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_opts() -> ScrapeOptions {
        ScrapeOptions {
            sold_out_threshold: 3,
            ..ScrapeOptions::default()
        }
    }

    #[test]
    fn sold_out_streak_trips_at_threshold() {
        let mut tracker = SoldOutTracker::new(&default_opts());
        assert!(!tracker.observe(StockStatus::SoldOut));
        assert!(!tracker.observe(StockStatus::SoldOut));
        assert!(tracker.observe(StockStatus::SoldOut));
    }

    #[test]
    fn in_stock_resets_sold_out_streak() {
        let mut tracker = SoldOutTracker::new(&default_opts());
        assert!(!tracker.observe(StockStatus::SoldOut));
        assert!(!tracker.observe(StockStatus::InStock));
        assert!(!tracker.observe(StockStatus::SoldOut));
        assert!(!tracker.observe(StockStatus::SoldOut));
    }

    #[test]
    fn full_scrape_disables_sold_out_stop() {
        let opts = ScrapeOptions {
            full_scrape: true,
            sold_out_threshold: 1,
            ..ScrapeOptions::default()
        };
        let mut tracker = SoldOutTracker::new(&opts);
        assert!(!tracker.observe(StockStatus::SoldOut));
        assert!(!tracker.observe(StockStatus::SoldOut));
    }

    #[test]
    fn known_urls_disable_sold_out_stop() {
        let opts = ScrapeOptions {
            known_urls: Some(HashSet::new()),
            sold_out_threshold: 1,
            ..ScrapeOptions::default()
        };
        let mut tracker = SoldOutTracker::new(&opts);
        assert!(!tracker.observe(StockStatus::SoldOut));
    }

    #[test]
    fn known_url_tracker_trips_after_streak() {
        let opts = ScrapeOptions {
            known_urls: Some(HashSet::new()),
            ..ScrapeOptions::default()
        };
        let mut tracker = KnownUrlTracker::new(&opts);
        for _ in 0..KNOWN_URL_STOP - 1 {
            assert!(!tracker.observe(true));
        }
        assert!(tracker.observe(true));
    }

    #[test]
    fn fresh_url_resets_known_streak() {
        let opts = ScrapeOptions {
            known_urls: Some(HashSet::new()),
            ..ScrapeOptions::default()
        };
        let mut tracker = KnownUrlTracker::new(&opts);
        for _ in 0..KNOWN_URL_STOP - 1 {
            tracker.observe(true);
        }
        assert!(!tracker.observe(false));
        assert!(!tracker.observe(true));
    }

    #[test]
    fn limit_reached_only_with_limit_set() {
        let opts = ScrapeOptions {
            limit: Some(2),
            ..ScrapeOptions::default()
        };
        assert!(!opts.limit_reached(1));
        assert!(opts.limit_reached(2));
        assert!(!ScrapeOptions::default().limit_reached(10_000));
    }
}
