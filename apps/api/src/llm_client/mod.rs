//! LLM Client: the single point of entry for all completion calls.
//!
//! No other module talks to the model provider directly. Handlers depend on
//! the `CompletionGateway` trait so tests can swap in a scripted fake.
//!
//! The provider speaks the OpenAI-compatible chat completions protocol
//! (Groq by default).
use std::pin::Pin;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::Stream;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod json;
pub mod prompts;
pub mod sse;

pub use json::parse_structured;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const MAX_TOKENS: u32 = 2048;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(4);
const MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model reply contained no JSON object")]
    NoJsonObject,

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// One completion call: optional system instruction, conversation, sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// A single user turn carrying the whole prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            ..Default::default()
        }
    }

    pub fn with_system(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: Some(system.into()),
            messages,
            temperature: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The full message list sent upstream, system instruction first.
    pub fn wire_messages(&self) -> Vec<ChatMessage> {
        self.system
            .iter()
            .map(|s| ChatMessage::new(Role::System, s.clone()))
            .chain(self.messages.iter().cloned())
            .collect()
    }
}

/// Lazy, finite, non-restartable sequence of generated text chunks.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Waits for the whole reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Resolves once upstream has accepted the request; chunks follow lazily.
    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LlmError>;
}

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Completion client for OpenAI-compatible providers, with bounded retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    config: LlmClientConfig,
}

impl LlmClient {
    pub fn new(api_key: String, config: LlmClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .user_agent(concat!("vitae-api/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            config: LlmClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends the request and returns the response once its status is a
    /// success. Connection failures, timeouts, 429 and 5xx are retried with
    /// jittered exponential backoff; nothing is retried once a successful
    /// response has been received.
    async fn send(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: request.wire_messages(),
            max_tokens: MAX_TOKENS,
            temperature: request.temperature,
            stream,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => to_api_error(response).await,
                Err(e) => LlmError::Http(e),
            };

            if !should_retry(&err) {
                return Err(err);
            }
            if attempt > self.config.max_retries {
                return Err(match err {
                    LlmError::Api { status: 429, .. } => LlmError::RateLimited {
                        retries: self.config.max_retries,
                    },
                    other => other,
                });
            }

            let delay = backoff_delay(INITIAL_BACKOFF, MAX_BACKOFF, attempt - 1);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "LLM call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CompletionGateway for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let response = self.send(&request, false).await?;
        let parsed: ChatCompletionResponse = response.json().await?;

        if let Some(usage) = &parsed.usage {
            debug!(
                input_tokens = usage.prompt_tokens,
                output_tokens = usage.completion_tokens,
                "LLM call succeeded"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LlmError> {
        let response = self.send(&request, true).await?;
        debug!(model = %self.config.model, "LLM stream opened");
        Ok(sse::decode_text_stream(response.bytes_stream()))
    }
}

async fn to_api_error(response: reqwest::Response) -> LlmError {
    let status = response.status();
    let body = read_limited_text(response, MAX_ERROR_BODY_BYTES).await;
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

fn should_retry(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => e.is_timeout() || e.is_connect(),
        LlmError::Api { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                || StatusCode::from_u16(*status).is_ok_and(|s| s.is_server_error())
        }
        LlmError::Parse(_)
        | LlmError::NoJsonObject
        | LlmError::RateLimited { .. }
        | LlmError::EmptyContent => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(response: reqwest::Response, max_bytes: usize) -> String {
    match response.bytes().await {
        Ok(mut bytes) => {
            bytes.truncate(max_bytes);
            String::from_utf8_lossy(&bytes).to_string()
        }
        Err(e) => {
            warn!(error = %e, "Failed to read upstream error body");
            String::new()
        }
    }
}
