//! Rate-limited page fetching with optional retry.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: core trait, one GET in and a [`Document`] or [`FetchError`] out
//! - [`HttpFetcher`]: `reqwest` implementation that paces consecutive requests
//! - [`RetryFetcher`]: decorator adding exponential backoff for transient failures
//!
//! A failed fetch is a normal return value here. Nothing in this module
//! panics or aborts the run.
//!
//! # Pacing
//!
//! Each source gets its own [`HttpFetcher`], so the pause between two
//! requests applies per site while the underlying `reqwest::Client`
//! (connection pool, headers, timeout) is shared. The pause is measured
//! from the end of the previous request, failed ones included.

use rand::{Rng, rng};
use reqwest::Client;
use scraper::Html;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::config::CrawlerConfig;
use crate::error::{FetchCause, FetchError};

/// A fetched HTML page.
///
/// The body is kept as text and parsed on demand: `scraper::Html` is not
/// `Send`, so it must never be held across an `.await`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub body: String,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Something that can GET a page.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}

impl<T: PageFetcher> PageFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        (**self).fetch(url).await
    }
}

/// Build the HTTP client shared by every source.
pub fn build_client(config: &CrawlerConfig) -> Result<Client, Box<dyn Error>> {
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Enforces a minimum interval between consecutive calls.
#[derive(Debug)]
pub struct Pacer {
    delay: StdDuration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: StdDuration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Run `request` once `delay` has passed since the previous request
    /// completed.
    ///
    /// The lock is held for the whole request, so requests through one
    /// pacer never overlap and a slow response still gets a full pause
    /// after it.
    pub async fn run<Fut: Future>(&self, request: Fut) -> Fut::Output {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        let output = request.await;
        *last = Some(Instant::now());
        output
    }
}

/// `reqwest`-backed fetcher for one source.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    pacer: Pacer,
}

impl HttpFetcher {
    pub fn new(client: Client, delay: StdDuration) -> Self {
        Self {
            client,
            pacer: Pacer::new(delay),
        }
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.pacer.run(self.get(url)).await
    }
}

impl HttpFetcher {
    async fn get(&self, url: &str) -> Result<Document, FetchError> {
        let t0 = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success status");
            return Err(FetchError::new(url, FetchCause::Status(status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(url, FetchCause::Body(e.to_string())))?;

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(Document::new(url, body))
    }
}

/// Wrapper that adds exponential backoff retry to any [`PageFetcher`].
///
/// Only [`FetchError::is_transient`] failures are retried. The delay
/// before attempt `n` is:
///
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetryFetcher<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter_ms: u64,
}

impl<T> RetryFetcher<T>
where
    T: PageFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(8),
            max_jitter_ms: 250,
        }
    }

    pub fn from_config(inner: T, config: &CrawlerConfig) -> Self {
        Self::new(
            inner,
            config.max_retries,
            StdDuration::from_millis(config.retry_base_delay_ms),
        )
        .with_max_delay(StdDuration::from_millis(config.retry_max_delay_ms))
        .with_max_jitter(StdDuration::from_millis(config.retry_max_jitter_ms))
    }

    pub fn with_max_delay(mut self, max_delay: StdDuration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter_ms = max_jitter.as_millis() as u64;
        self
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = if self.max_jitter_ms == 0 {
            0
        } else {
            rng().random_range(0..=self.max_jitter_ms)
        };
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetcher")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetcher<T>
where
    T: PageFetcher,
{
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(doc) => return Ok(doc),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(%url, attempt, max = self.max_retries, error = %e, "fetch exhausted retries");
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    warn!(%url, attempt, max = self.max_retries, ?delay, error = %e, "fetch failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}
