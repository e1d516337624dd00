//! Windowed pagination with early stop.
//!
//! Each `(source, section)` pair is crawled as a small state machine:
//!
//! ```text
//! Scanning(1) ──▶ Scanning(2) ──▶ ... ──▶ Stopped(reason)
//! ```
//!
//! A section stops when its listing page is unreachable or empty, when a
//! page shows only articles older than the window (listings are newest
//! first, so nothing further back can be in range), or when the page
//! ceiling is reached.
//!
//! Undated articles and articles newer than the window end neither count
//! as kept nor as evidence for stopping. Sponsored or pinned items mixed
//! into a listing can therefore cause under-collection; that is accepted.

use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::adapters::SourceAdapter;
use crate::aggregator::ArticleAggregator;
use crate::fetcher::PageFetcher;
use crate::models::{CrawlWindow, ListingEntry, Section, Source, WindowPosition};
use crate::utils::truncate_for_log;

/// Why pagination of a section ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A listing page had no article links.
    Exhausted,
    /// A listing page could not be fetched.
    Unreachable,
    /// A page held only articles older than the window.
    TooOld,
    /// `max_pages` pages were scanned.
    PageCeiling,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Exhausted => "exhausted",
            StopReason::Unreachable => "unreachable",
            StopReason::TooOld => "too_old",
            StopReason::PageCeiling => "page_ceiling",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Scanning { page: u32 },
    Stopped(StopReason),
}

impl CrawlState {
    pub fn start(max_pages: u32) -> Self {
        if max_pages == 0 {
            CrawlState::Stopped(StopReason::PageCeiling)
        } else {
            CrawlState::Scanning { page: 1 }
        }
    }
}

/// Window outcome counts for one listing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTally {
    pub in_range: usize,
    pub too_old: usize,
}

/// Transition after page `page` has been fully processed.
pub fn next_state(tally: PageTally, page: u32, max_pages: u32) -> CrawlState {
    if tally.too_old > 0 && tally.in_range == 0 {
        CrawlState::Stopped(StopReason::TooOld)
    } else if page < max_pages {
        CrawlState::Scanning { page: page + 1 }
    } else {
        CrawlState::Stopped(StopReason::PageCeiling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub label: String,
    pub pages_fetched: u32,
    pub kept: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Source,
    pub sections: Vec<SectionReport>,
}

impl SourceReport {
    pub fn empty(source: Source) -> Self {
        Self {
            source,
            sections: Vec::new(),
        }
    }

    pub fn kept(&self) -> usize {
        self.sections.iter().map(|s| s.kept).sum()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.sections.iter().map(|s| s.pages_fetched).sum()
    }
}

/// Drives the pagination of one source's sections.
pub struct WindowedCrawler<'a, A, F> {
    adapter: &'a A,
    fetcher: &'a F,
    window: CrawlWindow,
    max_pages: u32,
}

impl<'a, A, F> WindowedCrawler<'a, A, F>
where
    A: SourceAdapter,
    F: PageFetcher,
{
    pub fn new(adapter: &'a A, fetcher: &'a F, window: CrawlWindow, max_pages: u32) -> Self {
        Self {
            adapter,
            fetcher,
            window,
            max_pages,
        }
    }

    /// Crawl every section of the source, appending kept articles to `sink`.
    ///
    /// Failing to enumerate sections yields an empty report, not an error.
    #[instrument(level = "info", skip_all, fields(source = %self.adapter.source()))]
    pub async fn crawl_source(&self, sink: &ArticleAggregator) -> SourceReport {
        let source = self.adapter.source();
        let sections = match self.adapter.list_sections(self.fetcher).await {
            Ok(sections) => sections,
            Err(e) => {
                warn!(error = %e, "Could not list sections; skipping source");
                return SourceReport::empty(source);
            }
        };

        let mut report = SourceReport::empty(source);
        for section in &sections {
            report.sections.push(self.crawl_section(section, sink).await);
        }

        info!(
            sections = report.sections.len(),
            pages = report.pages_fetched(),
            kept = report.kept(),
            "Source finished"
        );
        report
    }

    #[instrument(level = "info", skip_all, fields(section = %section.label))]
    pub async fn crawl_section(&self, section: &Section, sink: &ArticleAggregator) -> SectionReport {
        let mut report = SectionReport {
            label: section.label.clone(),
            pages_fetched: 0,
            kept: 0,
            stop: StopReason::Exhausted,
        };
        let mut state = CrawlState::start(self.max_pages);

        loop {
            match state {
                CrawlState::Scanning { page } => {
                    state = self.scan_page(section, page, sink, &mut report).await;
                }
                CrawlState::Stopped(reason) => {
                    report.stop = reason;
                    info!(
                        pages = report.pages_fetched,
                        kept = report.kept,
                        stop = %reason,
                        "Section finished"
                    );
                    return report;
                }
            }
        }
    }

    async fn scan_page(
        &self,
        section: &Section,
        page: u32,
        sink: &ArticleAggregator,
        report: &mut SectionReport,
    ) -> CrawlState {
        let url = self.adapter.listing_page_url(section, page);
        let listing = match self.fetcher.fetch(&url).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(page, error = %e, "Listing page unreachable");
                return CrawlState::Stopped(StopReason::Unreachable);
            }
        };
        report.pages_fetched += 1;

        let entries = self.adapter.listing_entries(&listing);
        if entries.is_empty() {
            info!(page, %url, "No article links on listing page");
            return CrawlState::Stopped(StopReason::Exhausted);
        }
        debug!(page, count = entries.len(), "Listing entries");

        let mut tally = PageTally::default();
        for entry in &entries {
            self.process_entry(section, entry, sink, &mut tally).await;
        }
        report.kept += tally.in_range;

        info!(
            page,
            links = entries.len(),
            in_range = tally.in_range,
            too_old = tally.too_old,
            "Page scanned"
        );
        next_state(tally, page, self.max_pages)
    }

    async fn process_entry(
        &self,
        section: &Section,
        entry: &ListingEntry,
        sink: &ArticleAggregator,
        tally: &mut PageTally,
    ) {
        // A date on the listing settles the window question without
        // fetching the detail page.
        if let Some(raw) = &entry.raw_date {
            match self.adapter.parse_date(raw) {
                Ok(date) => match self.window.position(date) {
                    WindowPosition::InRange => {}
                    WindowPosition::TooOld => {
                        tally.too_old += 1;
                        return;
                    }
                    WindowPosition::TooNew => return,
                },
                Err(e) => {
                    debug!(url = %entry.url, error = %e, "Listing date unparseable; skipping");
                    return;
                }
            }
        }

        let article = match self.adapter.extract_article(self.fetcher, section, entry).await {
            Ok(article) => article,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "Skipping article");
                return;
            }
        };

        match article.parsed_date.map(|d| self.window.position(d)) {
            Some(WindowPosition::InRange) => {
                info!(title = %truncate_for_log(&article.title, 50), "Article kept");
                tally.in_range += 1;
                sink.add(article);
            }
            Some(WindowPosition::TooOld) => tally.too_old += 1,
            Some(WindowPosition::TooNew) => {}
            None => debug!(url = %article.url, raw_date = %article.raw_date, "Undated article ignored"),
        }
    }
}
