//! JSON dataset emission.
//!
//! The final articles are written as one JSON array, newest first:
//!
//! ```text
//! output_dir/
//! └── articles_unifies_20250612_130500.json
//! ```
//!
//! Each record carries `source`, `theme`, `title`, `date` (as published),
//! `date_parsed` (`YYYY-MM-DD HH:MM` or `null`), `author`, `body` and `url`.

use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::Article;

/// File name for a dataset produced at `now`.
pub fn dataset_filename(now: NaiveDateTime) -> String {
    format!("articles_unifies_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Sort newest first; records without a parsed date go last, in input order.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_key(|a| (a.parsed_date.is_none(), Reverse(a.parsed_date)));
}

/// Write `articles` to `{output_dir}/articles_unifies_{timestamp}.json`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(%output_dir, count = articles.len()))]
pub async fn write_dataset(
    articles: &mut [Article],
    output_dir: &str,
    now: NaiveDateTime,
) -> Result<PathBuf, Box<dyn Error>> {
    sort_newest_first(articles);
    let json = serde_json::to_string_pretty(&*articles)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = Path::new(output_dir).join(dataset_filename(now));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote dataset");

    Ok(path)
}
