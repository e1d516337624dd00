//! Small helpers for text handling and file system checks.
//!
//! - Label capitalization for harmonized themes
//! - String truncation for logging
//! - File system validation for the output directory

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Uppercase the first character and lowercase the rest.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(capitalize("RELIGION"), "Religion");
/// assert_eq!(capitalize("santé"), "Santé");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().chain(c.as_str().to_lowercase().chars()).collect(),
    }
}

/// Truncate a string for logging purposes.
///
/// Cuts on a character boundary after `max` characters and appends an
/// ellipsis, so accented titles never split a code point.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("Sénégal", 3), "Sén…");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…", &s[..cut]),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hello"), "Hello");
        assert_eq!(capitalize("RELIGION"), "Religion");
        assert_eq!(capitalize("sport Auto"), "Sport auto");
        assert_eq!(capitalize("économie"), "Économie");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("a"), "A");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
        assert_eq!(truncate_for_log("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        assert_eq!(truncate_for_log("Sénégal", 3), "Sén…");
        let long = "é".repeat(80);
        let result = truncate_for_log(&long, 50);
        assert_eq!(result.chars().count(), 51);
        assert!(result.ends_with('…'));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let dir = std::env::temp_dir().join(format!("senews_crawler_probe_{}", std::process::id()));
        let path = dir.to_string_lossy().to_string();

        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
