//! Completion-service boundary.
//!
//! A completion service takes an ordered sequence of role-tagged messages (a
//! persona directive plus prior transcript) and returns one response message.
//! The response may carry tool-call requests; the engine does not interpret
//! or execute them. A node that wishes to honor one must invoke the
//! capability itself and feed the result back through a follow-up
//! `complete` call with a [`Message::tool`] record.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::config::CompletionConfig;
use crate::message::Message;

/// A named external capability the completion service may request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the capability's arguments.
    pub parameters: Value,
}

/// A capability invocation requested by the completion service.
///
/// Advisory from the engine's point of view: an un-executed tool-call request
/// is a valid end state, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One completion response.
#[derive(Clone, Debug)]
pub struct Completion {
    /// The response message to append to the transcript.
    pub message: Message,
    /// Capability invocations the service asked for, in request order.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Completion {
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Errors raised at the completion-service boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum CompletionError {
    /// Transport-level failure talking to the service.
    #[error(transparent)]
    #[diagnostic(code(relaygraph::clients::completion_http))]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("completion API returned status {status}: {body}")]
    #[diagnostic(code(relaygraph::clients::completion_api))]
    Api { status: u16, body: String },

    /// The service answered successfully but with no choices.
    #[error("completion response contained no choices")]
    #[diagnostic(code(relaygraph::clients::completion_empty))]
    EmptyResponse,
}

/// The capability set a completion service exposes to node bodies.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produces one response for the given message sequence.
    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError>;

    /// Tools declared to the service for this binding.
    fn declared_tools(&self) -> &[ToolSpec] {
        &[]
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object, per the chat-completions wire format.
    arguments: String,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Construction takes an explicit [`CompletionConfig`]; tool declarations are
/// bound with [`bind_tools`](Self::bind_tools) and serialized into every
/// request. Transient failures are retried up to `max_retries` times before
/// surfacing, so callers see at most one appended response per call.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: CompletionConfig,
    tools: Vec<ToolSpec>,
}

impl ChatCompletionsClient {
    #[must_use]
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            tools: Vec::new(),
        }
    }

    /// Declares the given capabilities to the service.
    #[must_use]
    pub fn bind_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn try_complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        let request = WireRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools: self
                .tools
                .iter()
                .map(|t| WireTool {
                    kind: "function",
                    function: t,
                })
                .collect(),
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: WireResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                // Arguments arrive JSON-encoded; keep malformed payloads as
                // raw strings instead of failing the whole completion.
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
            })
            .collect();

        Ok(Completion {
            message: Message::new(
                &choice.message.role,
                choice.message.content.as_deref().unwrap_or(""),
            ),
            tool_calls,
        })
    }

    fn is_retryable(error: &CompletionError) -> bool {
        match error {
            CompletionError::Http(_) => true,
            CompletionError::Api { status, .. } => *status >= 500,
            CompletionError::EmptyResponse => false,
        }
    }
}

#[async_trait]
impl CompletionService for ChatCompletionsClient {
    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        let mut attempt = 0u32;
        loop {
            match self.try_complete(messages).await {
                Ok(completion) => return Ok(completion),
                Err(error) if Self::is_retryable(&error) && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, %error, "completion call failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(200 * u64::from(attempt)))
                        .await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn declared_tools(&self) -> &[ToolSpec] {
        &self.tools
    }
}
