//! Data models for feed entries and their processed representations.
//!
//! This module defines the data structures flowing through the pipeline:
//! - [`RawEntry`] and friends: Miniflux API records, decoded leniently
//! - [`ArticleInput`]: a normalized entry ready for enrichment
//! - [`EnrichedArticle`]: an article plus where its content came from
//! - [`SummaryResult`]: the per-article outcome of summarization
//! - [`CategoryGroup`]: summaries grouped for the report

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// Bucket used when a feed has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Response body of Miniflux `GET /v1/entries`.
#[derive(Debug, Deserialize)]
pub struct EntriesResponse {
    pub total: u64,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// One Miniflux entry. Only the fields the digest consumes are declared;
/// everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub id: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    /// Entry content as stored by Miniflux (usually HTML).
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub feed: Option<RawFeed>,
}

/// Feed metadata embedded in an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeed {
    pub id: i64,
    pub title: Option<String>,
    pub category: Option<RawCategory>,
}

/// User-defined feed category.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub id: i64,
    pub title: Option<String>,
}

/// Why a raw entry could not become an [`ArticleInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRejection {
    MissingUrl,
    InvalidUrl(String),
    MissingTimestamp,
}

impl std::fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRejection::MissingUrl => write!(f, "entry has no url"),
            EntryRejection::InvalidUrl(u) => write!(f, "entry url is not an absolute http(s) url: {u}"),
            EntryRejection::MissingTimestamp => write!(f, "entry has no publication time"),
        }
    }
}

/// A normalized feed entry.
///
/// Built once from a [`RawEntry`]; enrichment derives a new value through
/// [`ArticleInput::with_content`] rather than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleInput {
    pub id: i64,
    pub title: String,
    /// Always an absolute URL.
    pub url: String,
    pub category: String,
    /// Stored content, possibly empty, possibly HTML.
    pub content: String,
    pub published_at: DateTime<Utc>,
    /// Title of the feed the entry came from.
    pub source: String,
    pub author: String,
}

impl ArticleInput {
    /// Normalize a raw entry.
    ///
    /// Missing title, author and feed get placeholder values; a blank or
    /// missing category maps to [`UNCATEGORIZED`]. The entry is rejected when
    /// its URL is missing, not absolute or not HTTP(S), or when it carries
    /// neither a publication nor a creation time.
    pub fn from_entry(entry: &RawEntry) -> Result<Self, EntryRejection> {
        let raw_url = entry
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(EntryRejection::MissingUrl)?;
        let url = Url::parse(raw_url)
            .map_err(|_| EntryRejection::InvalidUrl(raw_url.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(EntryRejection::InvalidUrl(raw_url.to_string()));
        }

        let published_at = entry
            .published_at
            .or(entry.created_at)
            .ok_or(EntryRejection::MissingTimestamp)?;

        let category = entry
            .feed
            .as_ref()
            .and_then(|f| f.category.as_ref())
            .and_then(|c| c.title.as_deref())
            .map(normalize_category)
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        Ok(Self {
            id: entry.id,
            title: non_blank(entry.title.as_deref()).unwrap_or("Untitled").to_string(),
            url: url.to_string(),
            category,
            content: entry.content.clone().unwrap_or_default(),
            published_at,
            source: entry
                .feed
                .as_ref()
                .and_then(|f| non_blank(f.title.as_deref()))
                .unwrap_or("Unknown")
                .to_string(),
            author: non_blank(entry.author.as_deref()).unwrap_or("Unknown").to_string(),
        })
    }

    /// A copy of this article carrying `content` instead of the original.
    pub fn with_content(&self, content: String) -> Self {
        Self {
            content,
            ..self.clone()
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Map a blank category to [`UNCATEGORIZED`]; other names pass through as-is.
pub fn normalize_category(category: &str) -> String {
    if category.trim().is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        category.to_string()
    }
}

/// Where an article's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Content as stored by the feed service.
    Original,
    /// Content fetched from the article URL.
    Fetched,
}

/// An article after the sufficiency check and optional enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    pub article: ArticleInput,
    pub content_source: ContentSource,
    /// Why enrichment was attempted and failed, if it was.
    pub fetch_error: Option<String>,
}

impl EnrichedArticle {
    /// Wrap an article whose stored content is used unchanged.
    pub fn original(article: ArticleInput) -> Self {
        Self {
            article,
            content_source: ContentSource::Original,
            fetch_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Ok,
    Failed,
}

/// The outcome of summarizing one article.
///
/// On [`SummaryStatus::Failed`] the `summary` field holds a placeholder note,
/// never model output.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResult {
    pub article_id: i64,
    pub title: String,
    pub url: String,
    pub category: String,
    pub summary: String,
    pub status: SummaryStatus,
    pub source: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub content_source: ContentSource,
}

impl SummaryResult {
    pub fn is_ok(&self) -> bool {
        self.status == SummaryStatus::Ok
    }
}

/// Summaries sharing one category, in production order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<SummaryResult>,
}
