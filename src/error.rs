//! Error taxonomy for the crawl pipeline.
//!
//! Every error produced while crawling is recoverable by skipping: a
//! [`FetchError`] or [`ExtractError`] costs one article or one page, a
//! [`DateParseError`] only leaves `parsed_date` empty. The remaining types
//! are start-up failures surfaced by `main`.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::Source;

/// Why a single HTTP GET did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

/// A failed page fetch. Callers treat this as an ordinary outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch {url} failed: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    /// Timeouts, connection failures, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self.cause {
            FetchCause::Timeout | FetchCause::Network(_) | FetchCause::Body(_) => true,
            FetchCause::Status(code) => code == 429 || (500..600).contains(&code),
        }
    }

    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let cause = if e.is_timeout() {
            FetchCause::Timeout
        } else if let Some(status) = e.status() {
            FetchCause::Status(status.as_u16())
        } else {
            FetchCause::Network(e.to_string())
        };
        Self::new(url, cause)
    }
}

/// A detail page could not be turned into a [`RawArticle`](crate::models::RawArticle).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no recognizable title at {url}")]
    MissingTitle { url: String },
}

/// A date string that does not match its source's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{site} date {raw:?} does not match the expected format")]
pub struct DateParseError {
    pub site: Source,
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("crawl window starts at {start} but ends at {end}")]
    Inverted {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("a window reaching {days} days back starts before the earliest supported date")]
    OutOfRange { days: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
