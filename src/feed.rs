//! Miniflux feed source.
//!
//! Lists recent entries through the Miniflux REST API and turns them into
//! [`ArticleInput`]s. Entry listing is the one network step whose failure
//! aborts the run: without entries there is nothing to summarize.
//!
//! # API
//!
//! `GET {base}/v1/entries?order=published_at&direction=desc[&published_after=<unix>][&limit=<n>]`
//! with the API key in the `X-Auth-Token` header.

use crate::errors::FeedError;
use crate::models::{ArticleInput, EntriesResponse, RawEntry};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use itertools::Itertools;
use reqwest::StatusCode;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Source of raw feed entries.
pub trait FeedSource {
    /// List entries published after `since`, newest first. `None` lists all.
    async fn list_entries(&self, since: Option<DateTime<Utc>>) -> Result<Vec<RawEntry>, FeedError>;
}

/// Which entries a run should pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Hours(u32),
    All,
}

impl Lookback {
    /// The `published_after` cutoff relative to `now`, if any.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Lookback::Hours(h) => Some(now - ChronoDuration::hours(i64::from(*h))),
            Lookback::All => None,
        }
    }
}

/// [`FeedSource`] for a Miniflux instance.
pub struct MinifluxClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limit: Option<u32>,
    timeout: Duration,
}

impl fmt::Debug for MinifluxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifluxClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("limit", &self.limit)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MinifluxClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        limit: Option<u32>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("miniflux_digest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            limit,
            timeout,
        })
    }

    fn query(&self, since: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("order", "published_at".to_string()),
            ("direction", "desc".to_string()),
        ];
        if let Some(since) = since {
            query.push(("published_after", since.timestamp().to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

impl FeedSource for MinifluxClient {
    #[instrument(level = "info", skip_all, fields(base_url = %self.base_url, ?since))]
    async fn list_entries(&self, since: Option<DateTime<Utc>>) -> Result<Vec<RawEntry>, FeedError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(format!("{}/v1/entries", self.base_url))
            .header("X-Auth-Token", &self.api_key)
            .query(&self.query(since))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout(self.timeout)
                } else {
                    FeedError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body: EntriesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout(self.timeout)
            } else {
                FeedError::Decode(e.to_string())
            }
        })?;

        info!(
            total = body.total,
            returned = body.entries.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Listed feed entries"
        );
        Ok(body.entries)
    }
}

/// Normalize raw entries into articles, keeping feed order.
///
/// Duplicate entry ids keep their first occurrence. Entries that cannot be
/// normalized are logged and skipped.
pub fn build_articles(entries: Vec<RawEntry>) -> Vec<ArticleInput> {
    let total = entries.len();
    let articles: Vec<ArticleInput> = entries
        .into_iter()
        .unique_by(|e| e.id)
        .filter_map(|entry| match ArticleInput::from_entry(&entry) {
            Ok(article) => Some(article),
            Err(reason) => {
                warn!(id = entry.id, %reason, "Skipping entry");
                None
            }
        })
        .collect();
    debug!(total, kept = articles.len(), "Built article inputs");
    articles
}
