//! Error types for each stage of the digest pipeline.
//!
//! Only [`FeedError`], [`RenderError`] and [`ConfigError`] abort a run.
//! [`FetchError`] and [`SummarizationError`] are contained per article: the
//! pipeline records them on the article and moves on.

use std::time::Duration;
use thiserror::Error;

/// The feed source could not produce an entry listing.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed source unavailable: {0}")]
    Unavailable(String),

    #[error("feed source rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("feed source returned HTTP {0}")]
    Status(u16),

    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not decode feed response: {0}")]
    Decode(String),
}

/// Full-content enrichment failed for one article.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),

    #[error("response is not HTML (content-type: {0})")]
    NotHtml(String),

    #[error("no readable content extracted ({0} chars)")]
    NoReadableContent(usize),
}

/// Summarization failed for one article.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("backend request failed: {0}")]
    Backend(String),

    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("response contained no tool call")]
    MissingToolCall,

    #[error("model called unknown tool `{0}`")]
    UnknownTool(String),

    #[error("malformed tool arguments: {0}")]
    MalformedArguments(String),
}

impl SummarizationError {
    /// Short label shown in the report next to the placeholder summary.
    pub fn label(&self) -> &'static str {
        match self {
            SummarizationError::Backend(_) => "backend error",
            SummarizationError::Timeout(_) => "timed out",
            SummarizationError::MissingToolCall => "no tool call",
            SummarizationError::UnknownTool(_) => "unknown tool",
            SummarizationError::MalformedArguments(_) => "malformed response",
        }
    }
}

/// The report could not be produced or written.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format report: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Settings could not be loaded or are out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
