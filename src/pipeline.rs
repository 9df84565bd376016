//! End-to-end digest run: list → normalize → enrich → summarize → organize.
//!
//! Only a feed listing failure stops a run. Every article that makes it past
//! normalization comes out the other end as exactly one summary, in feed
//! order, whatever happened to it along the way.

use crate::api::ToolBackend;
use crate::enrich::fetcher::ContentFetcher;
use crate::enrich::{enrich_all, EnrichOptions};
use crate::errors::FeedError;
use crate::feed::{build_articles, FeedSource};
use crate::models::{CategoryGroup, ContentSource};
use crate::organizer::{organize, CategoryOrder};
use crate::summarizer::{summarize_all, SummarizerOptions};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Only entries published after this instant; `None` lists everything.
    pub since: Option<DateTime<Utc>>,
    /// Upper bound on the feed listing call.
    pub feed_timeout: Duration,
    pub enrich: EnrichOptions,
    pub summarizer: SummarizerOptions,
    pub category_order: CategoryOrder,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub entries_listed: usize,
    pub articles: usize,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub summarized: usize,
    pub summary_failed: usize,
}

/// The organized result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub groups: Vec<CategoryGroup>,
    pub stats: RunStats,
}

/// Run the whole pipeline once.
///
/// # Errors
///
/// Only [`FeedError`]: entry listing failed or timed out. Fetch and
/// summarization problems are absorbed per article.
#[instrument(level = "info", skip_all, fields(since = ?options.since))]
pub async fn run<S, F, B>(
    feed: &S,
    fetcher: &F,
    backend: &B,
    options: &PipelineOptions,
) -> Result<Digest, FeedError>
where
    S: FeedSource,
    F: ContentFetcher,
    B: ToolBackend,
{
    let t0 = Instant::now();

    let entries = tokio::time::timeout(options.feed_timeout, feed.list_entries(options.since))
        .await
        .map_err(|_| FeedError::Timeout(options.feed_timeout))??;
    let entries_listed = entries.len();

    let articles = build_articles(entries);
    info!(entries_listed, articles = articles.len(), "Articles to process");

    let enriched = enrich_all(fetcher, articles, &options.enrich).await;
    let summaries = summarize_all(backend, &enriched, &options.summarizer).await;

    let stats = RunStats {
        entries_listed,
        articles: enriched.len(),
        fetched: enriched
            .iter()
            .filter(|a| a.content_source == ContentSource::Fetched)
            .count(),
        fetch_failed: enriched.iter().filter(|a| a.fetch_error.is_some()).count(),
        summarized: summaries.iter().filter(|r| r.is_ok()).count(),
        summary_failed: summaries.iter().filter(|r| !r.is_ok()).count(),
    };

    let groups = organize(summaries, options.category_order);
    info!(
        categories = groups.len(),
        summarized = stats.summarized,
        summary_failed = stats.summary_failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Digest ready"
    );
    Ok(Digest { groups, stats })
}
