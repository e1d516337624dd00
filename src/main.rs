//! # SeneNews Crawler
//!
//! A date-windowed crawler for two Senegalese news sites, SeneNews and
//! Senego. It collects every article published inside a time window,
//! maps each site's section labels onto one shared theme vocabulary and
//! writes the result as a single JSON dataset.
//!
//! ## Usage
//!
//! ```sh
//! senews_crawler --days-back 2 -o ./data
//! ```
//!
//! ## Architecture
//!
//! 1. **Sections**: each source adapter enumerates the sections to crawl
//! 2. **Pagination**: listing pages are walked newest first and stop early
//!    once a page holds only articles older than the window
//! 3. **Extraction**: in-window articles are fetched and parsed
//! 4. **Harmonization**: section labels become canonical themes
//! 5. **Output**: the dataset is written newest first as pretty JSON
//!
//! Ctrl-C stops crawling but still harmonizes and writes what was
//! collected so far.

use chrono::Local;
use clap::Parser;
use reqwest::Client;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod adapters;
mod aggregator;
mod cli;
mod config;
mod crawler;
mod error;
mod fetcher;
mod harmonizer;
mod models;
mod outputs;
mod utils;

use adapters::{SeneNews, Senego, SourceAdapter};
use aggregator::{theme_distribution, ArticleAggregator};
use cli::Cli;
use config::{CrawlerConfig, SourceConfig};
use crawler::{SourceReport, WindowedCrawler};
use fetcher::{build_client, HttpFetcher, RetryFetcher};
use harmonizer::ThemeHarmonizer;
use models::{CrawlWindow, Source};
use outputs::json;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("senews_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = CrawlerConfig::load(args.config.as_deref())?;
    config.senenews.enabled &= args.wants(Source::SeneNews);
    config.senego.enabled &= args.wants(Source::Senego);

    let now = Local::now().naive_local();
    let window = match args.start {
        Some(start) => CrawlWindow::new(start, args.end.unwrap_or(now))?,
        None => CrawlWindow::days_back(args.end.unwrap_or(now), args.days_back)?,
    };
    info!(
        start = %window.start(),
        end = %window.end(),
        max_pages = args.max_pages,
        parallel = args.parallel_sources,
        "Crawl window"
    );

    // Early check: ensure the output dir is writable before crawling for minutes
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = build_client(&config)?;
    let senenews = config
        .senenews
        .enabled
        .then(|| SeneNews::new(&config.senenews.base_url))
        .transpose()?;
    let senego = config
        .senego
        .enabled
        .then(|| Senego::new(&config.senego.base_url))
        .transpose()?;

    let aggregator = ArticleAggregator::new();
    let run = Run {
        client: &client,
        config: &config,
        window,
        max_pages: args.max_pages,
        sink: &aggregator,
    };

    let senenews_run = run.source(senenews.as_ref(), &config.senenews);
    let senego_run = run.source(senego.as_ref(), &config.senego);
    let crawl = async {
        if args.parallel_sources {
            let (a, b) = futures::future::join(senenews_run, senego_run).await;
            vec![a, b]
        } else {
            vec![senenews_run.await, senego_run.await]
        }
    };

    let reports: Vec<SourceReport> = tokio::select! {
        reports = crawl => reports.into_iter().flatten().collect::<Vec<_>>(),
        _ = tokio::signal::ctrl_c() => {
            warn!(collected = aggregator.len(), "Interrupted; keeping articles collected so far");
            Vec::new()
        }
    };

    for report in &reports {
        for section in &report.sections {
            info!(
                source = %report.source,
                section = %section.label,
                pages = section.pages_fetched,
                kept = section.kept,
                stop = %section.stop,
                "Section summary"
            );
        }
    }

    let harmonizer = ThemeHarmonizer::default();
    debug!(rules = harmonizer.rules().len(), "Theme rules loaded");
    let mut articles = aggregator.harmonize_all(&harmonizer);

    if articles.is_empty() {
        info!(
            elapsed_secs = start_time.elapsed().as_secs_f64(),
            "No articles found in the crawl window; nothing written"
        );
        return Ok(());
    }

    let path = json::write_dataset(&mut articles, &args.output_dir, Local::now().naive_local()).await?;

    for (theme, count, pct) in theme_distribution(&articles) {
        info!(%theme, count, pct = %format!("{pct:.1}%"), "Theme distribution");
    }

    info!(
        path = %path.display(),
        articles = articles.len(),
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "senews_crawler completed"
    );

    Ok(())
}

/// Shared inputs of one crawl run.
struct Run<'a> {
    client: &'a Client,
    config: &'a CrawlerConfig,
    window: CrawlWindow,
    max_pages: u32,
    sink: &'a ArticleAggregator,
}

impl Run<'_> {
    /// Crawl one source with its own paced, retrying fetcher.
    ///
    /// Yields `None` when the source is disabled.
    async fn source<A: SourceAdapter>(&self, adapter: Option<&A>, settings: &SourceConfig) -> Option<SourceReport> {
        let adapter = adapter?;
        let fetcher = RetryFetcher::from_config(
            HttpFetcher::new(self.client.clone(), settings.request_delay()),
            self.config,
        );
        info!(source = %adapter.source(), delay_ms = settings.request_delay_ms, "Crawling source");

        let report = WindowedCrawler::new(adapter, &fetcher, self.window, self.max_pages)
            .crawl_source(self.sink)
            .await;
        Some(report)
    }
}
