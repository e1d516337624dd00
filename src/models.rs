//! Data models shared by the adapters, the crawler and the aggregator.
//!
//! - [`Source`]: which site a record came from
//! - [`Section`]: one paginated category of a site
//! - [`CrawlWindow`]: the inclusive time range a run is interested in
//! - [`ListingEntry`]: an article link found on a listing page
//! - [`RawArticle`]: a scraped record before theme harmonization
//! - [`Article`]: the final record with a canonical theme

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::WindowError;

/// Rendering used for `date_parsed` in emitted records.
pub const PARSED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Source {
    SeneNews,
    Senego,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::SeneNews => f.write_str("SeneNews"),
            Source::Senego => f.write_str("Senego"),
        }
    }
}

/// A navigable category of a site whose listing pages are paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Label as the site presents it; becomes the article's raw theme for
    /// sources that do not expose a breadcrumb.
    pub label: String,
    /// Absolute URL of the first listing page.
    pub url: String,
}

/// Inclusive `[start, end]` range of publication times wanted by a run.
///
/// Built once at start-up and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Where a parsed date falls relative to a [`CrawlWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    TooOld,
    InRange,
    TooNew,
}

impl CrawlWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window ending at `now` and reaching `days` days back.
    pub fn days_back(now: NaiveDateTime, days: u32) -> Result<Self, WindowError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or(WindowError::OutOfRange { days })?;
        Ok(Self { start, end: now })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn position(&self, date: NaiveDateTime) -> WindowPosition {
        if date < self.start {
            WindowPosition::TooOld
        } else if date > self.end {
            WindowPosition::TooNew
        } else {
            WindowPosition::InRange
        }
    }
}

/// An article link read off a listing page.
///
/// Some sources publish title, author and date next to the link; those
/// land here so the crawler can decide on the window before paying for
/// the detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub raw_date: Option<String>,
}

impl ListingEntry {
    pub fn link(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// One scraped record before harmonization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub source: Source,
    /// Free-form category label as the source supplied it.
    pub section_label: String,
    pub title: String,
    pub author: String,
    pub raw_date: String,
    /// `None` when `raw_date` does not match the source's date grammar.
    pub parsed_date: Option<NaiveDateTime>,
    pub url: String,
    pub body: String,
}

/// A harmonized record, ready for emission.
///
/// Field names follow the emitted dataset columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub source: Source,
    pub theme: String,
    pub title: String,
    #[serde(rename = "date")]
    pub raw_date: String,
    #[serde(rename = "date_parsed", serialize_with = "serialize_parsed_date")]
    pub parsed_date: Option<NaiveDateTime>,
    pub author: String,
    pub body: String,
    pub url: String,
}

impl Article {
    /// Derive the final record, dropping the raw section label.
    pub fn from_raw(raw: RawArticle, theme: String) -> Self {
        Self {
            source: raw.source,
            theme,
            title: raw.title,
            raw_date: raw.raw_date,
            parsed_date: raw.parsed_date,
            author: raw.author,
            body: raw.body,
            url: raw.url,
        }
    }
}

fn serialize_parsed_date<S>(date: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => s.serialize_str(&d.format(PARSED_DATE_FORMAT).to_string()),
        None => s.serialize_none(),
    }
}
