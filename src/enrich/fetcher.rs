//! Full-text retrieval for articles whose feed content is only a teaser.
//!
//! [`HttpFetcher`] performs a single timeout-bounded GET, refuses anything
//! that is not HTTP(S), follows a small number of redirects and extracts the
//! readable text of the page. Every failure comes back as a [`FetchError`];
//! the caller decides what to do with it.

use crate::config::FetcherSettings;
use crate::errors::FetchError;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

/// Retrieves readable article text from a URL.
pub trait ContentFetcher {
    /// Fetch `url` and return its main readable text.
    async fn fetch_full_content(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Containers tried in order when looking for the article body.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    r#"[role="main"]"#,
    ".content",
    ".post-content",
    ".article-content",
    ".entry-content",
    "main",
    ".main-content",
];

/// Subtrees that never contribute readable text.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "form",
];

static CONTENT_SELECTOR_LIST: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static BODY_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("body").ok());

/// [`ContentFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    min_extracted_chars: usize,
}

impl HttpFetcher {
    /// Build a fetcher with the configured user agent and redirect limit.
    ///
    /// Redirects are followed up to `max_redirects` hops and only while they
    /// stay on HTTP(S).
    pub fn new(settings: &FetcherSettings) -> Result<Self, FetchError> {
        let max_redirects = settings.max_redirects;
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                attempt.error("too many redirects")
            } else if !is_http(attempt.url()) {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(policy)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            min_extracted_chars: settings.min_extracted_chars,
        })
    }

    async fn get_html(&self, url: Url, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(FetchError::NotHtml(content_type.to_string()));
            }
        }

        response.text().await.map_err(|e| classify_reqwest(e, timeout))
    }
}

impl ContentFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_full_content(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !is_http(&parsed) {
            return Err(FetchError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let t0 = Instant::now();
        let body = tokio::time::timeout(timeout, self.get_html(parsed, timeout))
            .await
            .map_err(|_| FetchError::Timeout(timeout))??;
        let text = extract_readable_text(&body, self.min_extracted_chars)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            chars = text.chars().count(),
            "Extracted article text"
        );
        Ok(text)
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn classify_reqwest(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Request(e.to_string())
    }
}

/// Pull the main readable text out of an HTML page.
///
/// Picks the first matching content container (falling back to `<body>`),
/// skips scripts, styles and page chrome, and collapses whitespace.
///
/// # Errors
///
/// [`FetchError::NoReadableContent`] when the result is shorter than
/// `min_chars` characters.
pub fn extract_readable_text(html: &str, min_chars: usize) -> Result<String, FetchError> {
    let document = Html::parse_document(html);

    let container = CONTENT_SELECTOR_LIST
        .iter()
        .find_map(|sel| document.select(sel).next())
        .or_else(|| {
            BODY_SELECTOR
                .as_ref()
                .and_then(|sel| document.select(sel).next())
        });

    let text = container.map(visible_text).unwrap_or_default();
    let chars = text.chars().count();
    if chars < min_chars {
        return Err(FetchError::NoReadableContent(chars));
    }
    Ok(text)
}

fn visible_text(container: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in container.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != container.id())
            .chain(std::iter::once(*container))
            .filter_map(|a| a.value().as_element())
            .any(|el| SKIPPED_ELEMENTS.contains(&el.name()));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}
