//! LLM backend interaction through a tool-calling contract.
//!
//! The summarizer never parses free-form model text. It describes the output
//! it wants as a function schema ([`ToolSchema`]) and reads the arguments of
//! the tool call the model makes in reply.
//!
//! # Architecture
//!
//! - [`ToolBackend`]: core trait, one chat round-trip per call
//! - [`OllamaBackend`]: implementation for Ollama's `POST /api/chat`
//!
//! There is deliberately no retry layer: each article gets exactly one
//! attempt, bounded by the caller's timeout.

use crate::errors::SummarizationError;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// One chat message sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A function the model may call, described with a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            kind: "function",
            function: FunctionSchema {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Everything the backend needs for one round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSchema>,
}

/// A tool invocation returned by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Either a JSON object (Ollama) or a JSON-encoded string (OpenAI style).
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    /// Arguments as a JSON object, decoding the string form if needed.
    pub fn arguments_object(&self) -> Result<serde_json::Map<String, Value>, SummarizationError> {
        let value = match &self.arguments {
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .map_err(|e| SummarizationError::MalformedArguments(e.to_string()))?,
            other => other.clone(),
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(SummarizationError::MalformedArguments(format!(
                "expected an object, got {}",
                truncate_for_log(&other.to_string(), 120)
            ))),
        }
    }
}

/// The assistant's reply: optional text plus any tool calls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Trait for a chat backend that supports tool calling.
///
/// Implementors perform a single request. Timeouts and failure containment
/// are the caller's business.
pub trait ToolBackend {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send `request` and return the assistant message.
    async fn invoke(&self, request: &ChatRequest) -> Result<AssistantMessage, SummarizationError>;
}

/// [`ToolBackend`] for an Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for OllamaBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaBackend")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct OllamaChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolSchema],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<AssistantMessage>,
    error: Option<String>,
}

impl OllamaBackend {
    /// Create a backend talking to `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SummarizationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("miniflux_digest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizationError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

impl ToolBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(level = "debug", skip_all, fields(model = %request.model))]
    async fn invoke(&self, request: &ChatRequest) -> Result<AssistantMessage, SummarizationError> {
        let t0 = Instant::now();
        let body = OllamaChatBody {
            model: &request.model,
            messages: &request.messages,
            tools: &request.tools,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizationError::Timeout(self.timeout)
                } else {
                    SummarizationError::Backend(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SummarizationError::Timeout(self.timeout)
            } else {
                SummarizationError::Backend(e.to_string())
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate_for_log(&text, 300), "Backend returned error status");
            return Err(SummarizationError::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_for_log(&text, 200)
            )));
        }

        let parsed: OllamaChatResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, response_preview = %truncate_for_log(&text, 300), "Backend returned non-conforming JSON");
            SummarizationError::MalformedArguments(format!("unreadable response: {e}"))
        })?;

        if let Some(err) = parsed.error {
            return Err(SummarizationError::Backend(err));
        }

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Backend replied");
        Ok(parsed.message.unwrap_or_default())
    }
}
