//! Theme harmonization.
//!
//! Each source labels its articles with its own free-form categories
//! (`football`, `Senenews Sport`, `Sénégal - Actualités > Société > Justice`,
//! a lowercased menu entry, ...). [`ThemeHarmonizer::harmonize`] maps any of
//! them onto one canonical vocabulary.
//!
//! The mapping is an ordered list of [`ThemeRule`]s. Order is observable:
//! keyword rules are substring tests and several keywords overlap (`sport`
//! occurs in `senenews sport`, `contribution` in `contributions`), so the
//! first declared match must win.
//!
//! # Resolution order
//!
//! 1. blank input → `Autre`
//! 2. breadcrumb banner (`Sénégal - Actualités ...`)
//! 3. exact, case-insensitive label match
//! 4. keyword contained in the label
//! 5. generic "actualité" spellings → `Actualité`
//! 6. capitalized first word, if it looks like a word; otherwise `Autre`

use crate::utils::capitalize;

pub const OTHER: &str = "Autre";
pub const NEWS: &str = "Actualité";

/// Top-level breadcrumb banner used by SeneNews.
pub const NEWS_BANNER: &str = "Sénégal - Actualités";

/// Markers of front-page or push-notification breadcrumbs.
const FRONT_PAGE_MARKERS: [&str; 2] = ["A-La-Une", "Notification"];

const GENERIC_NEWS_LABELS: [&str; 4] = ["actualités", "actualites", "actualité", "actualite"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Lowercased label equals the pattern.
    Exact,
    /// Label starts with the pattern, a `>`-separated breadcrumb banner.
    BreadcrumbPrefix,
    /// Pattern occurs somewhere in the lowercased label.
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRule {
    pub match_kind: MatchKind,
    pub pattern: &'static str,
    pub canonical_theme: &'static str,
}

const fn rule(match_kind: MatchKind, pattern: &'static str, canonical_theme: &'static str) -> ThemeRule {
    ThemeRule {
        match_kind,
        pattern,
        canonical_theme,
    }
}

/// Raw label → canonical theme, in precedence order.
///
/// Each pair is used both as an exact rule and as a keyword rule.
const LABELS: [(&str, &str); 32] = [
    ("politique", "Politique"),
    ("economie", "Economie"),
    ("économie", "Economie"),
    ("pêche", "Economie"),
    ("peche", "Economie"),
    ("sport", "Sport"),
    ("sports", "Sport"),
    ("football", "Sport"),
    ("senenews sport", "Sport"),
    ("people", "People"),
    ("célébrités", "People"),
    ("celebrites", "People"),
    ("senenews people", "People"),
    ("société", "Société"),
    ("societe", "Société"),
    ("justice", "Société"),
    ("international", "International"),
    ("afrique", "International"),
    ("afrique - actualité senenews people", "International"),
    ("multimedia", "Multimedia"),
    ("multimédia", "Multimedia"),
    ("clip vidéo", "Multimedia"),
    ("senenews tv", "Multimedia"),
    ("contributions", "Opinion"),
    ("contribution", "Opinion"),
    ("meteo", "Météo"),
    ("météo", "Météo"),
    ("articles premium", "Premium"),
    ("premium", "Premium"),
    ("en direct", "Live"),
    ("live", "Live"),
    ("en direct / live", "Live"),
];

/// The built-in rule table: banner first, then exact rules, then keywords.
pub fn default_rules() -> Vec<ThemeRule> {
    let mut rules = vec![rule(MatchKind::BreadcrumbPrefix, NEWS_BANNER, NEWS)];
    rules.extend(LABELS.iter().map(|&(p, t)| rule(MatchKind::Exact, p, t)));
    rules.extend(LABELS.iter().map(|&(p, t)| rule(MatchKind::Keyword, p, t)));
    rules
}

/// Maps source labels onto canonical themes. Pure and total.
#[derive(Debug, Clone)]
pub struct ThemeHarmonizer {
    rules: Vec<ThemeRule>,
}

impl Default for ThemeHarmonizer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ThemeHarmonizer {
    pub fn new(rules: Vec<ThemeRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ThemeRule] {
        &self.rules
    }

    fn of_kind(&self, kind: MatchKind) -> impl Iterator<Item = &ThemeRule> {
        self.rules.iter().filter(move |r| r.match_kind == kind)
    }

    fn exact(&self, lower: &str) -> Option<&'static str> {
        self.of_kind(MatchKind::Exact)
            .find(|r| r.pattern == lower)
            .map(|r| r.canonical_theme)
    }

    fn keyword(&self, lower: &str) -> Option<&'static str> {
        self.of_kind(MatchKind::Keyword)
            .find(|r| lower.contains(r.pattern))
            .map(|r| r.canonical_theme)
    }

    /// Resolve a breadcrumb that starts with `rule.pattern`.
    ///
    /// `None` means the banner carried no usable segment and resolution
    /// continues with the plain-label rules.
    fn breadcrumb(&self, rule: &ThemeRule, label: &str) -> Option<String> {
        if label == rule.pattern || FRONT_PAGE_MARKERS.iter().any(|m| label.contains(m)) {
            return Some(rule.canonical_theme.to_string());
        }
        let (_, rest) = label.split_once('>')?;
        let segment = rest.split('>').next().unwrap_or_default().trim();
        if segment.is_empty() {
            return None;
        }
        Some(match self.exact(&segment.to_lowercase()) {
            Some(theme) => theme.to_string(),
            None => capitalize(segment),
        })
    }

    /// Map a source label onto a canonical theme. Never empty.
    pub fn harmonize(&self, original: &str) -> String {
        let label = original.trim();
        if label.is_empty() {
            return OTHER.to_string();
        }

        for banner in self.of_kind(MatchKind::BreadcrumbPrefix) {
            if label.starts_with(banner.pattern) {
                if let Some(theme) = self.breadcrumb(banner, label) {
                    return theme;
                }
            }
        }

        let lower = label.to_lowercase();
        if let Some(theme) = self.exact(&lower).or_else(|| self.keyword(&lower)) {
            return theme.to_string();
        }

        if GENERIC_NEWS_LABELS.contains(&lower.as_str()) {
            return NEWS.to_string();
        }

        // Tokens carrying digits are slugs or ids, not section names.
        match label.split_whitespace().next() {
            Some(word) if word.chars().count() > 2 && !word.chars().any(|c| c.is_ascii_digit()) => {
                capitalize(word)
            }
            _ => OTHER.to_string(),
        }
    }
}
