//! Command-line interface definitions.
//!
//! Every option can also be supplied through an environment variable.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, ValueEnum};

use crate::models::Source;

/// Command-line arguments for a crawl run.
///
/// # Examples
///
/// ```sh
/// # Last 24 hours from both sites
/// senews_crawler
///
/// # Last three days from Senego only, at most 5 pages per section
/// senews_crawler --days-back 3 --source senego --max-pages 5
///
/// # Explicit window
/// senews_crawler --start "2025-06-11" --end "2025-06-12 00:00" -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Crawl articles published within this many days before now
    #[arg(short, long, env = "CRAWL_DAYS_BACK", default_value_t = 1)]
    pub days_back: u32,

    /// Window start (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM`); overrides --days-back
    #[arg(long, value_parser = parse_datetime)]
    pub start: Option<NaiveDateTime>,

    /// Window end (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM`); defaults to now
    #[arg(long, value_parser = parse_datetime)]
    pub end: Option<NaiveDateTime>,

    /// Maximum listing pages scanned per section
    #[arg(short = 'p', long, env = "CRAWL_MAX_PAGES", default_value_t = 15)]
    pub max_pages: u32,

    /// Directory receiving the JSON dataset
    #[arg(short, long, env = "CRAWL_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Optional path to a YAML crawler configuration
    #[arg(short, long, env = "CRAWL_CONFIG")]
    pub config: Option<String>,

    /// Restrict the run to these sources (repeatable); defaults to all enabled
    #[arg(short, long = "source", value_enum)]
    pub sources: Vec<SourceArg>,

    /// Crawl the sources concurrently instead of one after the other
    #[arg(long)]
    pub parallel_sources: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Senenews,
    Senego,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Senenews => Source::SeneNews,
            SourceArg::Senego => Source::Senego,
        }
    }
}

impl Cli {
    /// Whether `source` was selected; an empty selection means every source.
    pub fn wants(&self, source: Source) -> bool {
        self.sources.is_empty() || self.sources.iter().any(|s| Source::from(*s) == source)
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(Default::default())))
        .map_err(|_| format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM, got {s:?}"))
}
