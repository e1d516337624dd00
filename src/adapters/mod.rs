//! Per-site source adapters.
//!
//! Every site structures its menus, listings and article pages
//! differently, so each one gets its own [`SourceAdapter`]. The crawler
//! only ever talks to this trait.
//!
//! # Supported Sources
//!
//! | Source | Module | Sections | Date grammar |
//! |--------|--------|----------|--------------|
//! | SeneNews | [`senenews`] | fixed `actualites` category | `DD/MM/YYYY à HH:MM` |
//! | Senego | [`senego`] | discovered from the navigation menu | `D mois YYYY` (French month names) |
//!
//! Adapters never hold a parsed `Html` across an `.await`: they fetch a
//! [`Document`], then hand it to a synchronous parsing function.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::{DateParseError, ExtractError, FetchError};
use crate::fetcher::{Document, PageFetcher};
use crate::models::{ListingEntry, RawArticle, Section, Source};

pub mod senego;
pub mod senenews;

pub use senego::Senego;
pub use senenews::SeneNews;

/// Paragraphs of this many characters or fewer are never body text.
pub const MIN_PARAGRAPH_CHARS: usize = 30;

pub trait SourceAdapter {
    fn source(&self) -> Source;

    /// Enumerate the sections to crawl. A failure yields no sections.
    async fn list_sections<F: PageFetcher>(&self, fetcher: &F) -> Result<Vec<Section>, FetchError>;

    /// Page 1 is the section URL itself; later pages use the paginated form.
    fn listing_page_url(&self, section: &Section, page: u32) -> String;

    /// Article links found on a fetched listing page, in page order.
    fn listing_entries(&self, listing: &Document) -> Vec<ListingEntry>;

    /// Fetch the detail page behind `entry` and build the raw record.
    async fn extract_article<F: PageFetcher>(
        &self,
        fetcher: &F,
        section: &Section,
        entry: &ListingEntry,
    ) -> Result<RawArticle, ExtractError>;

    fn parse_date(&self, raw: &str) -> Result<chrono::NaiveDateTime, DateParseError>;
}

/// Compile a selector that is known to be valid at build time.
pub(crate) fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty text under `selector`, searched from `root`.
pub(crate) fn first_text(root: ElementRef<'_>, selector: &Selector) -> Option<String> {
    root.select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// Resolve `href` against `base`, the way a browser follows a link.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

const BOILERPLATE_MARKERS: [&str; 10] = [
    "partager",
    "suivez",
    "lire aussi",
    "tags:",
    "par ",
    "source:",
    "facebook",
    "twitter",
    "whatsapp",
    "advertisement",
];

/// Whether a paragraph of article text is body content worth keeping.
///
/// Rejects short fragments and share/follow/ad boilerplate.
pub fn is_body_paragraph(text: &str) -> bool {
    if text.chars().count() <= MIN_PARAGRAPH_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    !BOILERPLATE_MARKERS.iter().any(|m| lower.contains(m))
}

/// `(tag, class)` pairs of inline ad blocks.
const AD_CONTAINERS: [(&str, &str); 2] = [("div", "responsiveinpost"), ("ins", "adsbygoogle")];

/// Whether `element` sits inside an inline ad block.
pub(crate) fn inside_ad_container(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            let el = ancestor.value();
            AD_CONTAINERS
                .iter()
                .any(|(tag, class)| el.name() == *tag && el.classes().any(|c| c == *class))
        })
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fetcher serving fixture pages.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::error::{FetchCause, FetchError};
    use crate::fetcher::{Document, PageFetcher};

    #[derive(Debug, Default)]
    pub struct FixtureFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl FixtureFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn requested(&self, url: &str) -> bool {
            self.requests().iter().any(|u| u == url)
        }
    }

    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(body) => Ok(Document::new(url, body.clone())),
                None => Err(FetchError::new(url, FetchCause::Status(404))),
            }
        }
    }
}
