//! HTTP client for an OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;

use crate::backend::{ChatBackend, Completion, SamplingParams};
use crate::config::ChatConfig;
use crate::messages::{ChatMessage, CompletionRequest, CompletionResponse};

/// Longest upstream body kept inside an error, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

pub struct ChatApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

/// Errors from the chat-completion API layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Chat API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A 2xx response without a usable reply.
    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),
}

impl ChatApi {
    pub fn new(config: &ChatConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: SamplingParams,
    ) -> Result<Completion, ChatApiError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
        };

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending chat completion request",
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ChatApiError::ApiError {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ChatApiError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatApiError::MalformedResponse("no choices returned".into()))?
            .message
            .content
            .unwrap_or_default();

        Ok(Completion {
            content,
            usage: parsed.usage.unwrap_or_default().total(),
        })
    }
}
