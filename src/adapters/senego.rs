//! Senego adapter.
//!
//! Senego sections are discovered from the site's navigation menu: every
//! menu link pointing at `/rubrique/...` is a section, except the first
//! one, which is a landing page rather than a category.
//!
//! Listing pages already show title, author and date for each article,
//! so the crawler can apply the window before fetching the detail page.
//! Dates are written out in French, e.g. `12 juin 2025`.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{SourceAdapter, element_text, first_text, resolve, sel};
use crate::error::{DateParseError, ExtractError, FetchError};
use crate::fetcher::{Document, PageFetcher};
use crate::models::{ListingEntry, RawArticle, Section, Source};

pub const UNKNOWN_AUTHOR: &str = "Auteur inconnu";
pub const UNKNOWN_DATE: &str = "Date inconnue";
pub const EMPTY_BODY: &str = "Contenu vide";

/// French month names in calendar order.
const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})\s+(\w+)\s+(\d{4})").unwrap());

static MENU_LINK: Lazy<Selector> = Lazy::new(|| {
    sel("header nav.nav .top-menu-content-wrapper .menuItemWrapper a.navItem")
});
static LISTING_ARTICLE: Lazy<Selector> =
    Lazy::new(|| sel("section.sectionWithSidebar section.postsSectionCenter article"));
static LISTING_TITLE: Lazy<Selector> = Lazy::new(|| sel("h2.archive-post-title a"));
static LISTING_AUTHOR: Lazy<Selector> = Lazy::new(|| sel("span.archive-post-author"));
static LISTING_DATE: Lazy<Selector> = Lazy::new(|| sel("span.archive-post-date"));
static DETAIL_TITLE: Lazy<Selector> = Lazy::new(|| sel("h1"));
static DETAIL_BODY: Lazy<Selector> =
    Lazy::new(|| sel("div.articleLeftContainer article div.article-detail-content123"));

#[derive(Debug, Clone)]
pub struct Senego {
    base: Url,
}

impl Senego {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    /// Sections from the navigation menu, in menu order.
    ///
    /// Labels are lowercased and de-duplicated: a repeated label keeps its
    /// first position and takes the URL of its last occurrence. The first
    /// surviving entry is dropped.
    fn sections_from_menu(&self, doc: &Document) -> Vec<Section> {
        let html = doc.html();
        let mut sections: Vec<Section> = Vec::new();

        for link in html.select(&MENU_LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve(&self.base, href) else {
                continue;
            };
            if !url.contains("/rubrique/") {
                continue;
            }
            let label = element_text(link).to_lowercase();
            match sections.iter_mut().find(|s| s.label == label) {
                Some(existing) => existing.url = url,
                None => sections.push(Section { label, url }),
            }
        }

        // TODO: confirm against the live menu whether the first rubrique is
        // really a landing page; until then the first entry is skipped as-is.
        if !sections.is_empty() {
            let dropped = sections.remove(0);
            debug!(label = %dropped.label, "Skipping first menu entry");
        }
        sections
    }

    fn parse_detail(
        &self,
        doc: &Document,
        section: &Section,
        entry: &ListingEntry,
    ) -> Result<RawArticle, ExtractError> {
        let html = doc.html();
        let root = html.root_element();

        let title = entry
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| first_text(root, &DETAIL_TITLE))
            .ok_or_else(|| ExtractError::MissingTitle {
                url: doc.url.clone(),
            })?;

        let body = html
            .select(&DETAIL_BODY)
            .next()
            .map(|content| {
                content
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| EMPTY_BODY.to_string());

        let raw_date = entry.raw_date.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string());
        let parsed_date = self.parse_date(&raw_date).ok();

        Ok(RawArticle {
            source: Source::Senego,
            section_label: section.label.clone(),
            title,
            author: entry.author.clone().unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            raw_date,
            parsed_date,
            url: entry.url.clone(),
            body,
        })
    }
}

impl SourceAdapter for Senego {
    fn source(&self) -> Source {
        Source::Senego
    }

    #[instrument(level = "info", skip_all)]
    async fn list_sections<F: PageFetcher>(&self, fetcher: &F) -> Result<Vec<Section>, FetchError> {
        let doc = fetcher.fetch(self.base.as_str()).await?;
        let sections = self.sections_from_menu(&doc);
        info!(count = sections.len(), "Discovered Senego sections");
        debug!(sections = ?sections.iter().map(|s| &s.label).collect::<Vec<_>>(), "Senego sections");
        Ok(sections)
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
        let mut entries = Vec::new();

        for article in html.select(&LISTING_ARTICLE) {
            let Some(anchor) = article.select(&LISTING_TITLE).next() else {
                warn!(url = %listing.url, "Senego listing item without title link");
                continue;
            };
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve(&self.base, href))
            else {
                continue;
            };
            entries.push(ListingEntry {
                url,
                title: Some(element_text(anchor)),
                author: first_text(article, &LISTING_AUTHOR),
                raw_date: Some(
                    first_text(article, &LISTING_DATE).unwrap_or_else(|| UNKNOWN_DATE.to_string()),
                ),
            });
        }
        entries
    }

    #[instrument(level = "info", skip_all, fields(url = %entry.url))]
    async fn extract_article<F: PageFetcher>(
        &self,
        fetcher: &F,
        section: &Section,
        entry: &ListingEntry,
    ) -> Result<RawArticle, ExtractError> {
        let doc = fetcher.fetch(&entry.url).await?;
        let article = self.parse_detail(&doc, section, entry)?;
        info!(bytes = article.body.len(), "Parsed Senego article");
        Ok(article)
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDateTime, DateParseError> {
        let err = || DateParseError {
            site: Source::Senego,
            raw: raw.to_string(),
        };
        let lower = raw.trim().to_lowercase();
        let caps = DATE_RE.captures(&lower).ok_or_else(err)?;

        let day: u32 = caps[1].parse().map_err(|_| err())?;
        let month = FRENCH_MONTHS
            .iter()
            .position(|m| *m == &caps[2])
            .ok_or_else(err)? as u32
            + 1;
        let year: i32 = caps[3].parse().map_err(|_| err())?;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(err)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::adapters::testing::FixtureFetcher;

    fn adapter() -> Senego {
        Senego::new(BASE).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_french_dates() {
        let a = adapter();
        assert_eq!(a.parse_date("12 juin 2025").unwrap(), day(2025, 6, 12));
        assert_eq!(a.parse_date("1 février 2024").unwrap(), day(2024, 2, 1));
        assert_eq!(a.parse_date("15 Août 2025").unwrap(), day(2025, 8, 15));
        assert_eq!(a.parse_date(" 31 décembre 2025 ").unwrap(), day(2025, 12, 31));
        assert_eq!(a.parse_date("Publié le 3 mars 2025 à 10h").unwrap(), day(2025, 3, 3));
    }

    #[test]
    fn test_every_month_name_is_known() {
        let a = adapter();
        for (i, name) in FRENCH_MONTHS.iter().enumerate() {
            let d = a.parse_date(&format!("10 {name} 2025")).unwrap();
            assert_eq!(d, day(2025, i as u32 + 1, 10));
        }
    }

    #[test]
    fn test_unparseable_french_dates() {
        let a = adapter();
        assert!(a.parse_date("Date inconnue").is_err());
        assert!(a.parse_date("12 june 2025").is_err());
        assert!(a.parse_date("31 février 2025").is_err());
        assert!(a.parse_date("").is_err());
        assert!(a.parse_date("12/06/2025 à 13:05").is_err());
    }

    #[tokio::test]
    async fn test_sections_skip_first_and_keep_rubriques_only() {
        let fetcher = FixtureFetcher::new().page(
            BASE,
            home(&[
                ("Actualité", "/rubrique/actualite"),
                ("Accueil", "/"),
                ("Politique", "/rubrique/politique"),
                ("Sport", "https://senego.com/rubrique/sport"),
                ("SPORT", "/rubrique/sport-2"),
            ]),
        );

        let sections = adapter().list_sections(&fetcher).await.unwrap();

        assert_eq!(
            sections,
            vec![
                Section {
                    label: "politique".to_string(),
                    url: "https://senego.com/rubrique/politique".to_string(),
                },
                Section {
                    label: "sport".to_string(),
                    url: "https://senego.com/rubrique/sport-2".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sections_fail_when_home_unreachable() {
        let fetcher = FixtureFetcher::new();
        assert!(adapter().list_sections(&fetcher).await.is_err());
    }

    #[test]
    fn test_listing_page_urls() {
        let s = Section {
            label: "sport".to_string(),
            url: "https://senego.com/rubrique/sport".to_string(),
        };
        assert_eq!(adapter().listing_page_url(&s, 1), "https://senego.com/rubrique/sport");
        assert_eq!(
            adapter().listing_page_url(&s, 2),
            "https://senego.com/rubrique/sport/page/2"
        );
    }

    #[test]
    fn test_listing_entries_carry_listing_metadata() {
        let body = listing(&[
            ("https://senego.com/a1", "Victoire des Lions", "12 juin 2025"),
            ("/a2", "Match nul", "11 juin 2025"),
        ]);
        let entries = adapter().listing_entries(&Document::new("https://senego.com/rubrique/sport", body));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://senego.com/a1");
        assert_eq!(entries[0].title.as_deref(), Some("Victoire des Lions"));
        assert_eq!(entries[0].author.as_deref(), Some("Awa Diop"));
        assert_eq!(entries[0].raw_date.as_deref(), Some("12 juin 2025"));
        assert_eq!(entries[1].url, "https://senego.com/a2");
    }

    #[test]
    fn test_listing_item_without_date_gets_placeholder() {
        let body = r#"<section class="sectionWithSidebar"><section class="postsSectionCenter">
            <article><h2 class="archive-post-title"><a href="/a3">Sans date</a></h2></article>
        </section></section>"#;
        let entries = adapter().listing_entries(&Document::new(BASE, body));
        assert_eq!(entries[0].raw_date.as_deref(), Some(UNKNOWN_DATE));
        assert_eq!(entries[0].author, None);
    }

    #[tokio::test]
    async fn test_extract_article_uses_listing_fields_and_detail_body() {
        let url = "https://senego.com/a1";
        let fetcher = FixtureFetcher::new().page(url, detail("Les Lions ont gagné."));
        let section = Section {
            label: "sport".to_string(),
            url: "https://senego.com/rubrique/sport".to_string(),
        };
        let entry = ListingEntry {
            url: url.to_string(),
            title: Some("Victoire des Lions".to_string()),
            author: None,
            raw_date: Some("12 juin 2025".to_string()),
        };

        let article = adapter().extract_article(&fetcher, &section, &entry).await.unwrap();

        assert_eq!(article.source, Source::Senego);
        assert_eq!(article.section_label, "sport");
        assert_eq!(article.title, "Victoire des Lions");
        assert_eq!(article.author, UNKNOWN_AUTHOR);
        assert_eq!(article.parsed_date, Some(day(2025, 6, 12)));
        assert_eq!(article.body, "Les Lions ont gagné.\nDeuxième ligne");
    }

    #[tokio::test]
    async fn test_extract_article_without_body_container() {
        let url = "https://senego.com/a2";
        let fetcher = FixtureFetcher::new().page(url, "<html><body><h1>Titre</h1></body></html>");
        let section = Section {
            label: "sport".to_string(),
            url: String::new(),
        };

        let article = adapter()
            .extract_article(&fetcher, &section, &ListingEntry::link(url))
            .await
            .unwrap();
        assert_eq!(article.title, "Titre");
        assert_eq!(article.body, EMPTY_BODY);
        assert_eq!(article.raw_date, UNKNOWN_DATE);
        assert_eq!(article.parsed_date, None);
    }
}
