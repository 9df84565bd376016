//! Content sufficiency detection and full-text enrichment.
//!
//! For each article the stored content is checked by [`detector`]; stubs are
//! re-fetched through a [`ContentFetcher`]. Enrichment never fails an
//! article: on any fetch error the stored content is kept and the error is
//! recorded on the [`EnrichedArticle`].
//!
//! Fetches run with bounded concurrency (one at a time by default) and the
//! output always comes back in input order.

pub mod detector;
pub mod fetcher;

use crate::models::{ArticleInput, ContentSource, EnrichedArticle};
use detector::{classify, is_sufficient, DetectorPolicy};
use fetcher::ContentFetcher;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How the enrichment pass behaves for one run.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub policy: DetectorPolicy,
    /// Per-article fetch timeout.
    pub timeout: Duration,
    /// Fetches in flight at once; clamped to at least 1.
    pub concurrency: usize,
    /// When false, stored content is always used as-is.
    pub enabled: bool,
}

/// Check one article and fetch its full text if the stored content is a stub.
///
/// The fetched text replaces the stored content only when it is longer, so
/// enrichment never shortens an article.
#[instrument(level = "info", skip_all, fields(id = article.id, url = %article.url))]
pub async fn enrich_article<F: ContentFetcher>(
    fetcher: &F,
    article: ArticleInput,
    options: &EnrichOptions,
) -> EnrichedArticle {
    if !options.enabled {
        return EnrichedArticle::original(article);
    }

    if is_sufficient(&article.content, &options.policy) {
        debug!("Stored content is sufficient");
        return EnrichedArticle::original(article);
    }
    debug!(
        verdict = ?classify(&article.content, &options.policy),
        "Stored content looks like a summary; fetching full text"
    );

    match fetcher.fetch_full_content(&article.url, options.timeout).await {
        Ok(text) => {
            let fetched_chars = text.chars().count();
            let stored_chars = article.content.chars().count();
            if fetched_chars > stored_chars {
                info!(fetched_chars, stored_chars, "Replaced stored content with fetched text");
                EnrichedArticle {
                    article: article.with_content(text),
                    content_source: ContentSource::Fetched,
                    fetch_error: None,
                }
            } else {
                debug!(fetched_chars, stored_chars, "Fetched text is not longer; keeping stored content");
                EnrichedArticle::original(article)
            }
        }
        Err(e) => {
            warn!(error = %e, "Full-text fetch failed; using stored content");
            EnrichedArticle {
                article,
                content_source: ContentSource::Original,
                fetch_error: Some(e.to_string()),
            }
        }
    }
}

/// Enrich every article, preserving input order.
#[instrument(level = "info", skip_all, fields(count = articles.len(), concurrency = options.concurrency))]
pub async fn enrich_all<F: ContentFetcher>(
    fetcher: &F,
    articles: Vec<ArticleInput>,
    options: &EnrichOptions,
) -> Vec<EnrichedArticle> {
    let enriched: Vec<EnrichedArticle> = stream::iter(articles)
        .map(|article| enrich_article(fetcher, article, options))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let fetched = enriched
        .iter()
        .filter(|a| a.content_source == ContentSource::Fetched)
        .count();
    let failed = enriched.iter().filter(|a| a.fetch_error.is_some()).count();
    info!(total = enriched.len(), fetched, failed, "Enrichment complete");
    enriched
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::FetchError;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted fetcher: answers per URL and records every call.
    #[derive(Default)]
    pub(crate) struct ScriptedFetcher {
        pub answers: HashMap<String, Result<String, u16>>,
        pub delays: HashMap<String, Duration>,
        pub calls: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn answer(mut self, url: &str, text: &str) -> Self {
            self.answers.insert(url.to_string(), Ok(text.to_string()));
            self
        }

        pub fn fail(mut self, url: &str, status: u16) -> Self {
            self.answers.insert(url.to_string(), Err(status));
            self
        }

        pub fn delay(mut self, url: &str, d: Duration) -> Self {
            self.delays.insert(url.to_string(), d);
            self
        }
    }

    impl ContentFetcher for ScriptedFetcher {
        async fn fetch_full_content(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            if let Some(d) = self.delays.get(url) {
                if *d > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(FetchError::Timeout(timeout));
                }
                tokio::time::sleep(*d).await;
            }
            match self.answers.get(url) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(status)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Request("connection refused".into())),
            }
        }
    }

    pub(crate) fn article(id: i64, category: &str, content: &str) -> ArticleInput {
        ArticleInput {
            id,
            title: format!("Article {id}"),
            url: format!("https://news.example.org/{id}"),
            category: category.to_string(),
            content: content.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            source: "Example Feed".into(),
            author: "Reporter".into(),
        }
    }

    pub(crate) fn full_text() -> String {
        "Officials confirmed the plan after a lengthy public hearing. ".repeat(15)
    }

    fn options() -> EnrichOptions {
        EnrichOptions {
            policy: DetectorPolicy::default(),
            timeout: Duration::from_millis(200),
            concurrency: 1,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_sufficient_content_is_not_fetched() {
        let fetcher = ScriptedFetcher::default();
        let a = article(1, "News", &full_text());
        let enriched = enrich_article(&fetcher, a.clone(), &options()).await;
        assert_eq!(enriched, EnrichedArticle::original(a));
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_stub_is_replaced_by_fetched_text() {
        let fetcher = ScriptedFetcher::default().answer("https://news.example.org/2", &full_text());
        let a = article(2, "News", "Brief summary of the story…");
        let enriched = enrich_article(&fetcher, a.clone(), &options()).await;
        assert_eq!(enriched.content_source, ContentSource::Fetched);
        assert_eq!(enriched.article.content, full_text());
        assert_eq!(enriched.article.id, a.id);
        assert!(enriched.fetch_error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_original_content() {
        let fetcher = ScriptedFetcher::default().fail("https://news.example.org/3", 503);
        let a = article(3, "News", "Brief summary.");
        let enriched = enrich_article(&fetcher, a.clone(), &options()).await;
        assert_eq!(enriched.content_source, ContentSource::Original);
        assert_eq!(enriched.article, a);
        assert_eq!(enriched.fetch_error.as_deref(), Some("server returned HTTP 503"));
    }

    #[tokio::test]
    async fn test_fetch_timeout_keeps_original_content() {
        let fetcher = ScriptedFetcher::default()
            .answer("https://news.example.org/4", &full_text())
            .delay("https://news.example.org/4", Duration::from_secs(5));
        let a = article(4, "News", "Brief summary.");
        let enriched = enrich_article(&fetcher, a.clone(), &options()).await;
        assert_eq!(enriched.article, a);
        assert!(enriched.fetch_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_shorter_fetched_text_never_regresses_content() {
        // Long but truncated stored content; the page yields less text
        let stored = format!("{}Read more", full_text());
        let fetcher = ScriptedFetcher::default().answer("https://news.example.org/5", "Short page text.");
        let a = article(5, "News", &stored);
        let enriched = enrich_article(&fetcher, a.clone(), &options()).await;
        assert_eq!(enriched.content_source, ContentSource::Original);
        assert_eq!(enriched.article.content, stored);
        assert!(enriched.fetch_error.is_none());
    }

    #[tokio::test]
    async fn test_disabled_enrichment_never_fetches() {
        let fetcher = ScriptedFetcher::default().answer("https://news.example.org/6", &full_text());
        let opts = EnrichOptions {
            enabled: false,
            ..options()
        };
        let enriched = enrich_article(&fetcher, article(6, "News", "Stub."), &opts).await;
        assert_eq!(enriched.content_source, ContentSource::Original);
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_enrich_all_length_never_decreases() {
        let fetcher = ScriptedFetcher::default()
            .answer("https://news.example.org/1", &full_text())
            .answer("https://news.example.org/2", "tiny")
            .fail("https://news.example.org/3", 404);
        let inputs = vec![
            article(1, "A", "stub"),
            article(2, "A", "a somewhat longer stub than the page"),
            article(3, "B", ""),
            article(4, "B", &full_text()),
        ];
        let out = enrich_all(&fetcher, inputs.clone(), &options()).await;
        assert_eq!(out.len(), inputs.len());
        for (before, after) in inputs.iter().zip(&out) {
            assert_eq!(before.id, after.article.id);
            assert!(after.article.content.chars().count() >= before.content.chars().count());
        }
    }

    #[tokio::test]
    async fn test_enrich_all_preserves_order_with_concurrency() {
        let fetcher = ScriptedFetcher::default()
            .answer("https://news.example.org/1", &full_text())
            .delay("https://news.example.org/1", Duration::from_millis(100))
            .answer("https://news.example.org/2", &full_text());
        let opts = EnrichOptions {
            concurrency: 4,
            ..options()
        };
        let out = enrich_all(&fetcher, vec![article(1, "A", "x"), article(2, "A", "y")], &opts).await;
        let ids: Vec<i64> = out.iter().map(|a| a.article.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(out.iter().all(|a| a.content_source == ContentSource::Fetched));
    }
}
