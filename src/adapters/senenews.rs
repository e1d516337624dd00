//! SeneNews adapter.
//!
//! SeneNews is crawled through a single category, `actualites`, whose
//! listing pages live at:
//!
//! ```text
//! https://www.senenews.com/category/actualites           (page 1)
//! https://www.senenews.com/category/actualites/page/{n}  (page n > 1)
//! ```
//!
//! The raw theme of an article is its breadcrumb, e.g.
//! `Sénégal - Actualités > Société > Justice`, which the harmonizer knows
//! how to unpack. Dates look like `12/06/2025 à 13:05`.

use chrono::NaiveDateTime;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::{
    SourceAdapter, element_text, first_text, inside_ad_container, is_body_paragraph, resolve, sel,
};
use crate::error::{DateParseError, ExtractError, FetchError};
use crate::fetcher::{Document, PageFetcher};
use crate::models::{ListingEntry, RawArticle, Section, Source};

/// Native rendering of a SeneNews timestamp.
pub const DATE_FORMAT: &str = "%d/%m/%Y à %H:%M";

/// Raw theme used when an article page has no breadcrumb.
pub const DEFAULT_SECTION_LABEL: &str = "Actualités";

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}/\d{2}/\d{4})\s+à\s+(\d{2}:\d{2})").unwrap());

static LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h2 a[href]",
        "h3 a[href]",
        ".entry-title a[href]",
        "article a[href]",
        r#"a[href*="/20"]"#,
    ]
    .into_iter()
    .map(sel)
    .collect()
});

static TITLE: Lazy<Selector> = Lazy::new(|| sel("h1.entry-title"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| sel("a.aSingle"));
static DATE: Lazy<Selector> = Lazy::new(|| sel("time span.date.updated"));
static BREADCRUMB: Lazy<Selector> = Lazy::new(|| sel(r#"p a[href*="category"]"#));
static BODY_CONTAINERS: Lazy<[Selector; 2]> =
    Lazy::new(|| [sel("div#articleBody"), sel("div.content-single-full")]);
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| sel("p"));

#[derive(Debug, Clone)]
pub struct SeneNews {
    base: Url,
}

impl SeneNews {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    fn host(&self) -> &str {
        self.base
            .host_str()
            .map(|h| h.trim_start_matches("www."))
            .unwrap_or_default()
    }

    /// Build a record from a parsed detail page.
    fn parse_detail(&self, doc: &Document, section: &Section) -> Result<RawArticle, ExtractError> {
        let html = doc.html();
        let root = html.root_element();

        let title = first_text(root, &TITLE).ok_or_else(|| ExtractError::MissingTitle {
            url: doc.url.clone(),
        })?;
        let author = first_text(root, &AUTHOR).unwrap_or_default();
        let raw_date = first_text(root, &DATE).unwrap_or_default();

        let crumbs: Vec<String> = root
            .select(&BREADCRUMB)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        let section_label = if crumbs.is_empty() {
            if section.label.is_empty() {
                DEFAULT_SECTION_LABEL.to_string()
            } else {
                section.label.clone()
            }
        } else {
            crumbs.join(" > ")
        };

        let parsed_date = self
            .parse_date(&raw_date)
            .inspect_err(|e| debug!(url = %doc.url, error = %e, "Unparseable SeneNews date"))
            .ok();

        Ok(RawArticle {
            source: Source::SeneNews,
            section_label,
            title,
            author,
            raw_date,
            parsed_date,
            url: doc.url.clone(),
            body: article_body(&html),
        })
    }
}

/// Body paragraphs of the article container, boilerplate removed.
fn article_body(html: &Html) -> String {
    let Some(container) = BODY_CONTAINERS
        .iter()
        .find_map(|s| html.select(s).next())
    else {
        return String::new();
    };

    container
        .select(&PARAGRAPH)
        .filter(|p| !inside_ad_container(*p))
        .map(element_text)
        .filter(|t| is_body_paragraph(t))
        .join("\n\n")
}

impl SourceAdapter for SeneNews {
    fn source(&self) -> Source {
        Source::SeneNews
    }

    async fn list_sections<F: PageFetcher>(&self, _fetcher: &F) -> Result<Vec<Section>, FetchError> {
        let url = resolve(&self.base, "/category/actualites").unwrap_or_else(|| {
            format!("{}/category/actualites", self.base.as_str().trim_end_matches('/'))
        });
        Ok(vec![Section {
            label: DEFAULT_SECTION_LABEL.to_string(),
            url,
        }])
    }

    fn listing_page_url(&self, section: &Section, page: u32) -> String {
        if page <= 1 {
            section.url.clone()
        } else {
            format!("{}/page/{}", section.url.trim_end_matches('/'), page)
        }
    }

    fn listing_entries(&self, listing: &Document) -> Vec<ListingEntry> {
        let html = listing.html();
        let host = self.host();

        let urls: Vec<String> = LINK_SELECTORS
            .iter()
            .flat_map(|s| html.select(s).collect::<Vec<_>>())
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(host))
            .filter_map(|href| resolve(&self.base, href))
            .unique()
            .collect();

        debug!(url = %listing.url, count = urls.len(), "SeneNews listing links");
        urls.into_iter().map(ListingEntry::link).collect()
    }

    #[instrument(level = "info", skip_all, fields(url = %entry.url))]
    async fn extract_article<F: PageFetcher>(
        &self,
        fetcher: &F,
        section: &Section,
        entry: &ListingEntry,
    ) -> Result<RawArticle, ExtractError> {
        let doc = fetcher.fetch(&entry.url).await?;
        let article = self.parse_detail(&doc, section)?;
        info!(bytes = article.body.len(), "Parsed SeneNews article");
        Ok(article)
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDateTime, DateParseError> {
        let err = || DateParseError {
            site: Source::SeneNews,
            raw: raw.to_string(),
        };
        let caps = DATE_RE.captures(raw).ok_or_else(err)?;
        let canonical = format!("{} à {}", &caps[1], &caps[2]);
        NaiveDateTime::parse_from_str(&canonical, DATE_FORMAT).map_err(|_| err())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::adapters::testing::FixtureFetcher;
    use chrono::NaiveDate;

    fn adapter() -> SeneNews {
        SeneNews::new(BASE).unwrap()
    }

    fn section() -> Section {
        Section {
            label: DEFAULT_SECTION_LABEL.to_string(),
            url: SECTION.to_string(),
        }
    }

    #[test]
    fn test_parse_date_native_format() {
        let d = adapter().parse_date("12/06/2025 à 13:05").unwrap();
        assert_eq!(
            d,
            NaiveDate::from_ymd_opt(2025, 6, 12)
                .unwrap()
                .and_hms_opt(13, 5, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_date_round_trips_through_native_format() {
        for raw in ["12/06/2025 à 13:05", "01/01/2024 à 00:00", "31/12/2025 à 23:59"] {
            let d = adapter().parse_date(raw).unwrap();
            assert_eq!(d.format(DATE_FORMAT).to_string(), raw);
        }
    }

    #[test]
    fn test_parse_date_finds_date_inside_surrounding_text() {
        let d = adapter().parse_date("Publié le 12/06/2025  à 13:05 par la rédaction");
        assert!(d.is_ok());
    }

    #[test]
    fn test_parse_date_rejects_other_grammars() {
        let a = adapter();
        assert!(a.parse_date("").is_err());
        assert!(a.parse_date("12 juin 2025").is_err());
        assert!(a.parse_date("32/13/2025 à 25:61").is_err());
        let err = a.parse_date("hier").unwrap_err();
        assert_eq!(err.site, Source::SeneNews);
    }

    #[test]
    fn test_listing_page_urls() {
        let a = adapter();
        assert_eq!(a.listing_page_url(&section(), 1), SECTION);
        assert_eq!(
            a.listing_page_url(&section(), 3),
            "https://www.senenews.com/category/actualites/page/3"
        );
    }

    #[tokio::test]
    async fn test_single_fixed_section() {
        let fetcher = FixtureFetcher::new();
        let sections = adapter().list_sections(&fetcher).await.unwrap();
        assert_eq!(sections, vec![section()]);
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn test_listing_entries_deduplicate_and_filter_foreign_links() {
        let body = r#"<html><body>
            <h2><a href="https://www.senenews.com/actualites/a1.html">A1</a></h2>
            <article><a href="https://www.senenews.com/actualites/a1.html">A1 again</a></article>
            <h3><a href="https://www.senenews.com/actualites/a2.html">A2</a></h3>
            <h2><a href="https://www.facebook.com/senenews">Facebook</a></h2>
            <a href="https://www.senenews.com/2025/06/12/a3.html">A3</a>
        </body></html>"#;
        let entries = adapter().listing_entries(&Document::new(SECTION, body));
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://www.senenews.com/actualites/a1.html",
                "https://www.senenews.com/actualites/a2.html",
                "https://www.senenews.com/2025/06/12/a3.html",
            ]
        );
        assert!(entries.iter().all(|e| e.raw_date.is_none()));
    }

    #[test]
    fn test_listing_without_links_is_empty() {
        let entries = adapter().listing_entries(&Document::new(SECTION, "<html><body></body></html>"));
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_extract_article_fields() {
        let url = "https://www.senenews.com/actualites/a1.html";
        let fetcher = FixtureFetcher::new().page(
            url,
            detail("Plan de relance", "12/06/2025 à 13:05", &["Sénégal - Actualités", "Economie"]),
        );

        let article = adapter()
            .extract_article(&fetcher, &section(), &ListingEntry::link(url))
            .await
            .unwrap();

        assert_eq!(article.source, Source::SeneNews);
        assert_eq!(article.title, "Plan de relance");
        assert_eq!(article.author, "Moussa Ndiaye");
        assert_eq!(article.raw_date, "12/06/2025 à 13:05");
        assert!(article.parsed_date.is_some());
        assert_eq!(article.section_label, "Sénégal - Actualités > Economie");
        assert_eq!(article.url, url);

        let paragraphs: Vec<&str> = article.body.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].starts_with("Le gouvernement"));
        assert!(paragraphs[1].starts_with("Les syndicats"));
    }

    #[tokio::test]
    async fn test_extract_article_without_breadcrumb_uses_default_label() {
        let url = "https://www.senenews.com/actualites/a2.html";
        let fetcher = FixtureFetcher::new().page(url, detail("Titre", "12/06/2025 à 13:05", &[]));

        let article = adapter()
            .extract_article(&fetcher, &section(), &ListingEntry::link(url))
            .await
            .unwrap();
        assert_eq!(article.section_label, "Actualités");
    }

    #[tokio::test]
    async fn test_extract_article_keeps_record_with_bad_date() {
        let url = "https://www.senenews.com/actualites/a3.html";
        let fetcher = FixtureFetcher::new().page(url, detail("Titre", "il y a 2 heures", &[]));

        let article = adapter()
            .extract_article(&fetcher, &section(), &ListingEntry::link(url))
            .await
            .unwrap();
        assert_eq!(article.parsed_date, None);
        assert_eq!(article.raw_date, "il y a 2 heures");
    }

    #[tokio::test]
    async fn test_extract_article_without_title_fails() {
        let url = "https://www.senenews.com/actualites/notitle.html";
        let fetcher = FixtureFetcher::new().page(url, "<html><body><p>rien</p></body></html>");

        let r = adapter()
            .extract_article(&fetcher, &section(), &ListingEntry::link(url))
            .await;
        assert!(matches!(r, Err(ExtractError::MissingTitle { .. })));
    }

    #[tokio::test]
    async fn test_extract_article_unreachable_fails() {
        let fetcher = FixtureFetcher::new();
        let r = adapter()
            .extract_article(&fetcher, &section(), &ListingEntry::link("https://www.senenews.com/x"))
            .await;
        assert!(matches!(r, Err(ExtractError::Fetch(_))));
    }
}
