//! Per-article summarization through the `summarize_article` tool.
//!
//! Every article yields exactly one [`SummaryResult`]. Backend errors,
//! timeouts and malformed tool calls are turned into a `failed` result with a
//! placeholder summary; nothing here propagates an error to the caller.
//!
//! Articles are summarized strictly one after another, in input order.

use crate::api::{AssistantMessage, ChatMessage, ChatRequest, ToolBackend, ToolSchema};
use crate::errors::SummarizationError;
use crate::models::{EnrichedArticle, SummaryResult, SummaryStatus};
use crate::utils::{strip_html, truncate_content};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Name of the function the model must call.
pub const TOOL_NAME: &str = "summarize_article";

/// Placeholder used when no summary could be produced.
pub const FALLBACK_SUMMARY: &str = "Summary unavailable";

#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    pub model: String,
    /// Cap on article characters included in the prompt.
    pub max_content_chars: usize,
    /// Upper bound on one backend round-trip.
    pub timeout: Duration,
}

/// The tool schema: a single required `summary` string.
pub fn summary_tool() -> ToolSchema {
    ToolSchema::function(
        TOOL_NAME,
        "Record a summary of the article.",
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "A 2-4 sentence summary of the article"
                }
            },
            "required": ["summary"]
        }),
    )
}

/// Build the chat request for one article.
pub fn build_request(article: &EnrichedArticle, options: &SummarizerOptions) -> ChatRequest {
    let a = &article.article;
    let (content, _) = truncate_content(&strip_html(&a.content), options.max_content_chars);
    let prompt = format!(
        "Please summarize this article using the {TOOL_NAME} tool.\n\n\
         Title: \"{}\"\n\
         Source: {}\n\
         Author: {}\n\
         Published: {}\n\
         Content: {}\n",
        a.title,
        a.source,
        a.author,
        a.published_at.to_rfc3339(),
        content,
    );
    ChatRequest {
        model: options.model.clone(),
        messages: vec![ChatMessage::user(prompt)],
        tools: vec![summary_tool()],
    }
}

/// Pull the summary out of the assistant's tool call.
pub fn extract_summary(message: &AssistantMessage) -> Result<String, SummarizationError> {
    let call = message
        .tool_calls
        .first()
        .ok_or(SummarizationError::MissingToolCall)?;
    if call.function.name != TOOL_NAME {
        return Err(SummarizationError::UnknownTool(call.function.name.clone()));
    }
    let args = call.function.arguments_object()?;
    match args.get("summary") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(serde_json::Value::String(_)) => Err(SummarizationError::MalformedArguments(
            "summary is empty".into(),
        )),
        Some(_) => Err(SummarizationError::MalformedArguments(
            "summary is not a string".into(),
        )),
        None => Err(SummarizationError::MalformedArguments(
            "summary field missing".into(),
        )),
    }
}

async fn request_summary<B: ToolBackend>(
    backend: &B,
    article: &EnrichedArticle,
    options: &SummarizerOptions,
) -> Result<String, SummarizationError> {
    let request = build_request(article, options);
    let message = tokio::time::timeout(options.timeout, backend.invoke(&request))
        .await
        .map_err(|_| SummarizationError::Timeout(options.timeout))??;
    extract_summary(&message)
}

/// Summarize one article. Never fails: errors become a `failed` result.
#[instrument(level = "info", skip_all, fields(id = article.article.id, backend = backend.name()))]
pub async fn summarize<B: ToolBackend>(
    backend: &B,
    article: &EnrichedArticle,
    options: &SummarizerOptions,
) -> SummaryResult {
    let t0 = Instant::now();
    let a = &article.article;
    let (summary, status) = match request_summary(backend, article, options).await {
        Ok(summary) => {
            debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Summarized article");
            (summary, SummaryStatus::Ok)
        }
        Err(e) => {
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                title = %a.title,
                error = %e,
                "Summarization failed; using placeholder"
            );
            (format!("{FALLBACK_SUMMARY} ({})", e.label()), SummaryStatus::Failed)
        }
    };

    SummaryResult {
        article_id: a.id,
        title: a.title.clone(),
        url: a.url.clone(),
        category: a.category.clone(),
        summary,
        status,
        source: a.source.clone(),
        author: a.author.clone(),
        published_at: a.published_at,
        content_source: article.content_source,
    }
}

/// Summarize articles sequentially, one result per input, in input order.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<B: ToolBackend>(
    backend: &B,
    articles: &[EnrichedArticle],
    options: &SummarizerOptions,
) -> Vec<SummaryResult> {
    let mut results = Vec::with_capacity(articles.len());
    for (i, article) in articles.iter().enumerate() {
        debug!(index = i, id = article.article.id, "Summarizing article");
        results.push(summarize(backend, article, options).await);
    }
    let failed = results.iter().filter(|r| !r.is_ok()).count();
    info!(total = results.len(), failed, "Summarization complete");
    results
}
