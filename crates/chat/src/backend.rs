use async_trait::async_trait;

use crate::api::ChatApiError;
use crate::messages::ChatMessage;

/// Sampling settings for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

/// Settings for conversational replies.
pub const CHAT_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.7,
    max_tokens: 1024,
    top_p: 0.9,
};

/// Settings for design summaries.
pub const SUMMARY_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.6,
    max_tokens: 1024,
    top_p: 0.9,
};

/// Raw reply from the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    /// Prompt plus completion tokens.
    pub usage: u64,
}

/// A chat-completion service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: SamplingParams,
    ) -> Result<Completion, ChatApiError>;
}
