//! Completion client for model invocation
//!
//! `CompletionClient` is the single seam between the executor and the model
//! transport. `HttpCompletionClient` talks to an OpenAI-compatible
//! chat-completions proxy (LiteLLM in the default configuration).

use crate::config::ProxyConfig;
use crate::conversation::{Conversation, ConversationMessage};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of characters of an error body kept in `ProviderStatus`
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Capability to obtain one completion from a model
///
/// Allows dependency injection of different transports, enabling tests to use
/// fakes that succeed, fail, or hang on command.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion of `conversation` from `model_id`
    ///
    /// Implementations should give up after `timeout`. Any error is treated by
    /// the executor as a transient failure.
    async fn complete(
        &self,
        model_id: &str,
        conversation: &Conversation,
        timeout: Duration,
    ) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client for an OpenAI-compatible proxy
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    /// Create a client for `base_url` (ending in `/v1`)
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a client from the `[proxy]` section, resolving the API key
    pub fn from_config(proxy: &ProxyConfig) -> AppResult<Self> {
        let api_key = proxy.resolve_api_key();
        if api_key.is_none() {
            tracing::warn!(
                api_key_env = %proxy.api_key_env,
                "No proxy API key configured, sending unauthenticated requests"
            );
        }
        Self::new(&proxy.base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        model_id: &str,
        conversation: &Conversation,
        timeout: Duration,
    ) -> AppResult<String> {
        let body = ChatCompletionRequest {
            model: model_id,
            messages: conversation.messages(),
        };

        tracing::debug!(
            model = model_id,
            url = %self.completions_url(),
            message_count = conversation.len(),
            timeout_seconds = timeout.as_secs(),
            "Sending completion request"
        );

        let mut request = self
            .http
            .post(self.completions_url())
            .timeout(timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::CompletionTimeout {
                    model: model_id.to_string(),
                    timeout_seconds: timeout.as_secs(),
                }
            } else {
                AppError::CompletionFailed {
                    model: model_id.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderStatus {
                model: model_id.to_string(),
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::CompletionTimeout {
                    model: model_id.to_string(),
                    timeout_seconds: timeout.as_secs(),
                }
            } else {
                AppError::MalformedResponse {
                    model: model_id.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::MalformedResponse {
                model: model_id.to_string(),
                reason: "response contained no message content".to_string(),
            })
    }
}
