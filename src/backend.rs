//! Backend calls against the remote text-generation service.
//!
//! The [`Backend`] trait is the one capability the dispatcher and the judge
//! depend on: given a [`Request`], produce a [`CallResult`]. Failures never
//! escape as errors; they are folded into the result so one bad call cannot
//! take down its siblings.
//!
//! [`HttpBackend`] picks a [`CallStrategy`] from the request's [`CallShape`],
//! so nothing upstream branches on which model it is talking to.

use crate::config::Config;
use crate::error::ChorusError;
use crate::models::CallShape;
use crate::types::{CallResult, Request};
use crate::{log_debug, log_warn};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

/// Longest slice of an error body kept in a result
const ERROR_BODY_EXCERPT: usize = 200;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one call. Always returns a result, successful or not.
    async fn invoke(&self, request: Request) -> CallResult;
}

/// Wire-format strategy for one call shape
pub trait CallStrategy: Send + Sync {
    /// Endpoint path relative to the service root
    fn path(&self) -> &'static str;

    /// JSON body for `request`
    fn payload(&self, request: &Request) -> Value;

    /// Pull the generated text out of a successful response body
    fn extract_text(&self, body: &str) -> Result<String, ChorusError>;
}

/// Strategy for the given shape
pub fn strategy_for(shape: CallShape) -> &'static dyn CallStrategy {
    match shape {
        CallShape::Chat => &ChatStrategy,
        CallShape::RawCompletion => &CompletionStrategy,
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// `/chat/completions`: the prefixed prompt as a single user message
pub struct ChatStrategy;

impl CallStrategy for ChatStrategy {
    fn path(&self) -> &'static str {
        "chat/completions"
    }

    fn payload(&self, request: &Request) -> Value {
        json!({
            "model": request.model.identifier,
            "messages": [{ "role": "user", "content": request.full_prompt() }],
        })
    }

    fn extract_text(&self, body: &str) -> Result<String, ChorusError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| ChorusError::Remote(format!("malformed chat response: {e}")))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChorusError::Remote("no choices in response".to_string()))?;
        Ok(choice
            .message
            .content
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

/// `/completions`: the prefixed prompt as raw input plus the token budget
pub struct CompletionStrategy;

impl CallStrategy for CompletionStrategy {
    fn path(&self) -> &'static str {
        "completions"
    }

    fn payload(&self, request: &Request) -> Value {
        json!({
            "model": request.model.identifier,
            "prompt": request.full_prompt(),
            "max_tokens": request.max_tokens,
        })
    }

    fn extract_text(&self, body: &str) -> Result<String, ChorusError> {
        let response: CompletionResponse = serde_json::from_str(body)
            .map_err(|e| ChorusError::Remote(format!("malformed completion response: {e}")))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChorusError::Remote("no choices in response".to_string()))?;
        Ok(choice.text.trim().to_string())
    }
}

/// Backend talking to an OpenAI-compatible HTTP API
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl HttpBackend {
    pub fn new(config: Arc<Config>) -> Result<Self, ChorusError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chorus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChorusError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn send(&self, request: &Request) -> Result<String, ChorusError> {
        let strategy = strategy_for(request.model.shape);
        let url = self.config.endpoint(strategy.path());
        log_debug!(
            "POST {} for {} ({} prompt bytes)",
            url,
            request.model,
            request.full_prompt().len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&strategy.payload(request))
            .send()
            .await
            .map_err(|e| ChorusError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChorusError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ChorusError::Remote(format!(
                "status {status}: {}",
                error_message(&body)
            )));
        }

        strategy.extract_text(&body)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn invoke(&self, request: Request) -> CallResult {
        let start = Instant::now();
        let model = request.model.identifier.clone();

        let result = match self.send(&request).await {
            Ok(text) => {
                log_debug!("{} answered with {} bytes", model, text.len());
                CallResult::success(model, text)
            }
            Err(e) => {
                log_warn!("{} failed: {}", model, e);
                CallResult::failure(model, &e)
            }
        };

        result.with_elapsed_ms(elapsed_ms(start))
    }
}

/// Service error message if the body carries one, else a trimmed excerpt
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Milliseconds since `start`, saturating
pub fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
