//! Accumulation and harmonization of scraped articles.
//!
//! The aggregator is append-only while crawling. Appends go through a
//! mutex so several sources may feed the same aggregator concurrently.
//! Harmonization consumes the aggregator and derives a fresh [`Article`]
//! per record, which means no caller can ever observe a half-harmonized
//! dataset.

use itertools::Itertools;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};

use crate::harmonizer::ThemeHarmonizer;
use crate::models::{Article, RawArticle};

#[derive(Debug, Default)]
pub struct ArticleAggregator {
    records: Mutex<Vec<RawArticle>>,
}

impl ArticleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Vec<RawArticle>> {
        // A panic in another appender leaves the list itself intact.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, article: RawArticle) {
        self.records().push(article);
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `harmonizer` to every record's section label, in append order.
    ///
    /// Produces exactly one [`Article`] per appended record.
    #[instrument(level = "info", skip_all)]
    pub fn harmonize_all(self, harmonizer: &ThemeHarmonizer) -> Vec<Article> {
        let records = self
            .records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let label_counts = records.iter().map(|r| r.section_label.as_str()).counts();
        for (label, count) in label_counts.iter().sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0))) {
            info!(%label, count, "Original theme");
        }

        let articles: Vec<Article> = records
            .into_iter()
            .map(|raw| {
                let theme = harmonizer.harmonize(&raw.section_label);
                Article::from_raw(raw, theme)
            })
            .collect();

        info!(
            count = articles.len(),
            themes = articles.iter().map(|a| &a.theme).unique().count(),
            "Harmonization complete"
        );
        articles
    }
}

/// Per-theme `(theme, count, percentage)`, most frequent first.
pub fn theme_distribution(articles: &[Article]) -> Vec<(String, usize, f64)> {
    let total = articles.len();
    articles
        .iter()
        .map(|a| a.theme.as_str())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
        .map(|(theme, count)| {
            let pct = count as f64 * 100.0 / total as f64;
            (theme.to_string(), count, pct)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn raw(label: &str, title: &str) -> RawArticle {
        RawArticle {
            source: Source::SeneNews,
            section_label: label.to_string(),
            title: title.to_string(),
            author: String::new(),
            raw_date: String::new(),
            parsed_date: None,
            url: format!("https://www.senenews.com/{title}.html"),
            body: String::new(),
        }
    }

    #[test]
    fn test_harmonization_preserves_count_and_order() {
        let agg = ArticleAggregator::new();
        agg.add(raw("football", "a"));
        agg.add(raw("", "b"));
        agg.add(raw("Sénégal - Actualités > Société > Justice", "c"));
        agg.add(raw("football", "d"));
        assert_eq!(agg.len(), 4);

        let articles = agg.harmonize_all(&ThemeHarmonizer::default());

        assert_eq!(articles.len(), 4);
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
        let themes: Vec<&str> = articles.iter().map(|a| a.theme.as_str()).collect();
        assert_eq!(themes, vec!["Sport", "Autre", "Société", "Sport"]);
    }

    #[test]
    fn test_empty_aggregator_yields_empty_dataset() {
        let agg = ArticleAggregator::new();
        assert!(agg.is_empty());
        assert!(agg.harmonize_all(&ThemeHarmonizer::default()).is_empty());
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let agg = ArticleAggregator::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let agg = &agg;
                s.spawn(move || {
                    for i in 0..50 {
                        agg.add(raw("sport", &format!("t{t}-{i}")));
                    }
                });
            }
        });
        assert_eq!(agg.len(), 200);
        assert_eq!(agg.harmonize_all(&ThemeHarmonizer::default()).len(), 200);
    }

    #[test]
    fn test_theme_distribution() {
        let agg = ArticleAggregator::new();
        for label in ["sport", "football", "politique", "people"] {
            agg.add(raw(label, label));
        }
        let articles = agg.harmonize_all(&ThemeHarmonizer::default());
        let dist = theme_distribution(&articles);

        assert_eq!(dist[0], ("Sport".to_string(), 2, 50.0));
        assert_eq!(dist.len(), 3);
        assert_eq!(dist[1].0, "People");
        assert_eq!(dist[2].0, "Politique");
    }
}
