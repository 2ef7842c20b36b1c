//! Data models shared by providers, the session, and the render sinks.
//!
//! - [`Article`]: a provider-agnostic article, every field optional
//! - [`Credential`]: an opaque API key that never prints in clear
//! - [`Category`]: the enumerated category filter, with `All` meaning "no filter"
//! - [`PageQuery`]: what a single fetch asks for
//! - [`PageView`] and [`Region`]: what gets handed to a render sink
//!
//! Upstream data is untrusted, so normalization never fails on a missing
//! field; it just leaves the field empty and lets the sink substitute a
//! placeholder.

use crate::pagination::Pagination;
use crate::utils::mask_secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized news article as produced by any provider.
///
/// No identity invariant is enforced: the same story from two providers is
/// two articles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline.
    pub title: Option<String>,
    /// Short summary or lede.
    pub description: Option<String>,
    /// Link to the full story.
    pub url: Option<String>,
    /// Lead image (`urlToImage` on NewsAPI, `image` on Mediastack).
    pub image_url: Option<String>,
    /// Byline, when the provider has one.
    pub author: Option<String>,
    /// Article body excerpt. NewsAPI sends a truncated `content`; Mediastack
    /// has no equivalent.
    pub content: Option<String>,
    /// Publication instant, `None` if missing or not RFC 3339.
    pub published_at: Option<DateTime<Utc>>,
    /// Label of the provider this article came from.
    pub source: Option<String>,
}

/// Parse a provider timestamp leniently.
///
/// Both providers send RFC 3339 (`2024-05-06T12:00:00Z` and
/// `2024-05-06T12:00:00+00:00`); anything else is dropped rather than failing
/// the whole page.
pub fn parse_published_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// One API account's key.
///
/// Opaque and immutable. `Debug` and `Display` mask all but the last four
/// characters so credentials can be logged freely.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building a request and nothing else.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", mask_secret(&self.0))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_secret(&self.0))
    }
}

/// Category filter offered by the category selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    pub const VARIANTS: [Category; 8] = [
        Category::All,
        Category::Business,
        Category::Entertainment,
        Category::General,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }

    /// The value to send upstream, or `None` for the "all" sentinel.
    pub fn as_filter(&self) -> Option<&'static str> {
        match self {
            Category::All => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted.is_empty() {
            return Ok(Category::All);
        }
        Category::VARIANTS
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown category {s:?} (expected one of: {})",
                    Category::VARIANTS.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// One fetch request: which category and which 1-based page.
///
/// `page_size` and `offset` are filled in by [`Pagination`], so providers
/// never compute them on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub category: Category,
    pub page: u32,
    pub page_size: u32,
    /// Zero-based index of the first article on `page`.
    pub offset: u64,
}

impl PageQuery {
    /// Query for `page` at the default page size.
    pub fn new(category: Category, page: u32) -> Self {
        let mut pagination = Pagination::default();
        pagination.go_to_page(page);
        pagination.query(category)
    }
}

/// What a provider region ended up showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RegionOutcome {
    Articles(Vec<Article>),
    /// A successful response with nothing in it.
    NoResults,
    /// A user-facing failure message.
    Failed(String),
}

/// A labelled block of the rendered page, one per provider (or one in total
/// when the merged layout is used).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub label: String,
    pub outcome: RegionOutcome,
}

/// Everything a render sink needs to draw one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub query: PageQuery,
    /// Whether the "previous" control is enabled.
    pub previous_enabled: bool,
    pub regions: Vec<Region>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_masked() {
        let key = Credential::new("05d99e5db00d46f9b344f43b85a58f59");
        let shown = format!("{key:?} {key}");
        assert!(!shown.contains("05d99e5db00d46f9"));
        assert!(shown.contains("8f59"));
        assert_eq!(key.expose(), "05d99e5db00d46f9b344f43b85a58f59");
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Business".parse::<Category>().unwrap(), Category::Business);
        assert_eq!(" sports ".parse::<Category>().unwrap(), Category::Sports);
        assert_eq!("ALL".parse::<Category>().unwrap(), Category::All);
    }

    #[test]
    fn test_empty_category_means_all() {
        assert_eq!("".parse::<Category>().unwrap(), Category::All);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = "politics".parse::<Category>().unwrap_err();
        assert!(err.contains("politics"));
        assert!(err.contains("technology"));
    }

    #[test]
    fn test_all_sentinel_has_no_filter() {
        assert_eq!(Category::All.as_filter(), None);
        assert_eq!(Category::Health.as_filter(), Some("health"));
    }

    #[test]
    fn test_page_query_clamps_page_zero() {
        assert_eq!(PageQuery::new(Category::All, 0).page, 1);
    }

    #[test]
    fn test_parse_published_at_accepts_both_provider_formats() {
        let a = parse_published_at(Some("2024-05-06T12:00:00Z")).unwrap();
        let b = parse_published_at(Some("2024-05-06T12:00:00+00:00")).unwrap();
        assert_eq!(a, b);
        assert_eq!(parse_published_at(Some("yesterday")), None);
        assert_eq!(parse_published_at(None), None);
    }
}
