//! Resumable, AI-assisted bookmark curation.
//!
//! `tidymark` pages through a [Raindrop.io](https://raindrop.io/) collection,
//! asks a language model (via [OpenRouter](https://openrouter.ai/)) what to
//! do with each bookmark, lets a human confirm or override the suggestions in
//! small batches, and checkpoints progress after every batch so a long
//! cleanup can be stopped and resumed at any point.
//!
//! The core abstraction is the
//! [`CleanupOrchestrator`](pipeline::CleanupOrchestrator). It borrows four
//! collaborators, each behind a trait:
//!
//! | Seam | Trait | Production implementation |
//! |------|-------|---------------------------|
//! | bookmark service | [`BookmarkSource`](source::BookmarkSource) | [`RaindropClient`](source::RaindropClient) |
//! | recommendations | [`RecommendationEngine`](recommend::RecommendationEngine) | [`LlmRecommender`](recommend::LlmRecommender) over [`OpenRouterClient`] |
//! | batch review | [`DecisionPresenter`](ui::DecisionPresenter) | [`TextPresenter`](ui::TextPresenter), or the full-screen one in `tidymark-tui` |
//! | other prompts | [`Prompter`](ui::Prompter) | [`ConsolePrompter`](ui::ConsolePrompter) |
//!
//! and owns a [`SessionState`](session::SessionState) for the collection.
//!
//! ```ignore
//! use tidymark::prelude::*;
//!
//! let source = RaindropClient::new(token)?;
//! let engine = LlmRecommender::new(OpenRouterClient::new(key)?, DEFAULT_MODEL);
//! let state = SessionState::new(SessionStore::new(".raindrop_state")?);
//!
//! let mut orchestrator = CleanupOrchestrator::new(
//!     &source, &engine, &TextPresenter, &ConsolePrompter, state, OrchestratorConfig::default(),
//! )
//! .with_event_handler(&LoggingHandler);
//!
//! let outcome = orchestrator.process(&job).await?;
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | bookmarks, collections, actions, decisions, fuzzy collection lookup |
//! | [`source`] | [`BookmarkSource`](source::BookmarkSource) trait and the Raindrop.io client |
//! | [`recommend`] | recommendation engine trait, prompt template, answer parser |
//! | [`session`] | durable per-collection progress |
//! | [`pipeline`] | the batch loop, action execution, lifecycle events |
//! | [`ui`] | presenter and prompter traits, line-based terminal implementations |
//! | [`interrupt`] | Ctrl-C signal shared between the CLI and the pipeline |

pub mod error;
pub mod interrupt;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod recommend;
pub mod session;
pub mod source;
pub mod ui;

use error::CompletionError;
use recommend::{ChatBackend, CompletionFuture};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for recommendations.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4";

/// Completion budget for one batch answer.
pub const RECOMMENDATION_MAX_TOKENS: u32 = 1500;

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation. Batch prompts are sent as a
/// single user turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tidymark/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: OPENROUTER_URL.to_string(),
        })
    }

    /// Send requests somewhere other than [`OPENROUTER_URL`].
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn chat(&self, body: &ChatRequest) -> Result<String, CompletionError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}",
            body.model.as_deref().unwrap_or("(none)"),
            body.messages.len(),
            body.max_tokens,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://github.com/tacryt-socryp/tidymark")
            .header("X-Title", "tidymark")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RawChatResponse = serde_json::from_str(&text)?;
        if let Some(err) = parsed.error {
            return Err(CompletionError::Api(err.message));
        }
        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::Empty)
    }
}

impl ChatBackend for OpenRouterClient {
    fn complete<'a>(&'a self, model: &'a str, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: Some(model.to_string()),
                messages: vec![Message::user(prompt)],
                max_tokens: RECOMMENDATION_MAX_TOKENS,
            };
            self.chat(&body).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_is_one_user_turn() {
        let req = ChatRequest {
            model: Some("test-model".into()),
            messages: vec![Message::user("hi")],
            max_tokens: 100,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn chat_request_skips_unset_fields() {
        let json = serde_json::to_value(ChatRequest::default()).unwrap();
        assert!(json.get("model").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn raw_response_error_field_parses() {
        let parsed: RawChatResponse =
            serde_json::from_str(r#"{"error": {"message": "quota exceeded"}}"#).unwrap();
        assert_eq!(parsed.error.unwrap().message, "quota exceeded");
        assert!(parsed.choices.is_none());
    }
}
