// Answer service client
//
// One blocking chat-completion round-trip per question. Failures never
// propagate as panics or retries: they become an absent answer plus the
// error to show the user.

use std::time::Duration;

use askgrid_config::ai::ResolvedAIConfig;
use askgrid_config::settings::{AIProvider, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};

/// System turn sent with every question
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// provider = none
    #[error("AI is disabled (provider=none)")]
    Disabled,
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx response; `message` is the API's own error text when present
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Text shown to the user when a question could not be answered
    pub fn user_message(&self) -> String {
        format!("Error with OpenAI API: {}", self)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Backends
// ============================================================================

/// Anything that can turn a chat request into the raw content of the first
/// choice.
pub trait CompletionBackend {
    fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError>;
}

impl<T: CompletionBackend + ?Sized> CompletionBackend for Box<T> {
    fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

/// OpenAI-compatible HTTP backend (`POST {base}/chat/completions`)
#[derive(Debug)]
pub struct OpenAIClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    disabled: bool,
}

impl OpenAIClient {
    /// Build from resolved configuration. A missing key is not rejected
    /// here; the server's 401 is reported like any other API error.
    pub fn new(config: &ResolvedAIConfig) -> Result<Self, CompletionError> {
        let mut client = Self::build(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )?;
        client.disabled = config.provider == AIProvider::None;
        Ok(client)
    }

    /// Point at an arbitrary base URL (local servers, tests).
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        Self::build(api_key, base_url.into(), None)
    }

    fn build(
        api_key: Option<String>,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        // reqwest's blocking client defaults to 30s; None disables it
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            disabled: false,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl CompletionBackend for OpenAIClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        if self.disabled {
            return Err(CompletionError::Disabled);
        }

        let url = self.completions_url();
        log::debug!(
            "POST {} model={} max_tokens={} auth={}",
            url,
            request.model,
            request.max_tokens,
            self.api_key.is_some()
        );

        let mut builder = self.http.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
                Ok(body) => body.error.message,
                Err(_) => error_text,
            };
            return Err(CompletionError::Api { status: status.as_u16(), message });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            CompletionError::InvalidResponse("No choices in response".to_string())
        })?;
        choice.message.content.ok_or_else(|| {
            CompletionError::InvalidResponse("Choice has no message content".to_string())
        })
    }
}

// ============================================================================
// Answer service
// ============================================================================

/// Answer text, or the explicit absence value of a failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Absent,
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Answer::Absent)
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Text(s) => f.write_str(s),
            Answer::Absent => f.write_str("None"),
        }
    }
}

/// Result of one question: an absent answer always carries its error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub answer: Answer,
    pub error: Option<CompletionError>,
}

pub struct AnswerService<B> {
    backend: B,
    model: String,
    max_tokens: u32,
}

impl<B: CompletionBackend> AnswerService<B> {
    pub fn new(backend: B, model: impl Into<String>, max_tokens: u32) -> Self {
        Self { backend, model: model.into(), max_tokens }
    }

    /// Default model and token limit
    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, DEFAULT_MODEL, DEFAULT_MAX_TOKENS)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn request_for(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
        }
    }

    pub fn ask(&self, prompt: &str) -> AskOutcome {
        let request = self.request_for(prompt);
        match self.backend.complete(&request) {
            Ok(content) => AskOutcome {
                answer: Answer::Text(content.trim().to_string()),
                error: None,
            },
            Err(e) => {
                log::warn!("completion request failed: {}", e);
                AskOutcome { answer: Answer::Absent, error: Some(e) }
            }
        }
    }
}

impl AnswerService<OpenAIClient> {
    /// HTTP-backed service using the resolved model and token limit
    pub fn from_config(config: &ResolvedAIConfig) -> Result<Self, CompletionError> {
        let backend = OpenAIClient::new(config)?;
        Ok(Self::new(backend, config.model.clone(), config.max_tokens))
    }
}
