use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::chat::model::Turn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_COMPLETION_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// Coarse classification of a failed completion call, decided from the HTTP
/// status of the response (or the transport error), never from the failure
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    AuthFailed,
    TimedOut,
    Other,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("completion request failed: {message}")]
    Api { kind: LlmErrorKind, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn kind(&self) -> LlmErrorKind {
        match self {
            LlmError::Api { kind, .. } => *kind,
            LlmError::MissingApiKey => LlmErrorKind::AuthFailed,
            LlmError::InvalidResponse(_) => LlmErrorKind::Other,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            LlmErrorKind::TimedOut
        } else {
            LlmErrorKind::Other
        };
        LlmError::Api {
            kind,
            message: e.to_string(),
        }
    }
}

/// The remote completion service: an ordered message list in, one assistant
/// reply out. Trait object so tests can substitute a stub.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, messages: &[Turn]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI-compatible chat-completion client. Built once at startup and
/// shared; holds no per-request state.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new() -> Result<Self, LlmError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

fn classify_status(status: StatusCode) -> LlmErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => LlmErrorKind::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmErrorKind::AuthFailed,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LlmErrorKind::TimedOut,
        _ => LlmErrorKind::Other,
    }
}

#[async_trait]
impl CompletionApi for LlmClient {
    async fn complete(&self, messages: &[Turn]) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(LlmError::Api {
                kind: classify_status(status),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))
    }
}
