//! Conversational replies and design summaries on top of a [`ChatBackend`].

use std::sync::Arc;

use serde::Serialize;

use crate::api::ChatApiError;
use crate::backend::{ChatBackend, CHAT_SAMPLING, SUMMARY_SAMPLING};
use crate::messages::IncomingMessage;
use crate::prompts::{normalize_chat_messages, summary_request};
use crate::reasoning::strip_reasoning;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub usage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReply {
    pub summary: String,
    pub usage: u64,
}

/// Stateless design assistant. Each call is one upstream request.
#[derive(Clone)]
pub struct DesignAssistant {
    backend: Arc<dyn ChatBackend>,
}

impl DesignAssistant {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Continue a conversation, returning the reply without reasoning blocks.
    pub async fn chat(&self, messages: &[IncomingMessage]) -> Result<ChatReply, ChatApiError> {
        let outbound = normalize_chat_messages(messages);
        tracing::info!(message_count = outbound.len(), "Requesting chat reply");

        let completion = self.backend.complete(&outbound, CHAT_SAMPLING).await?;
        let content = strip_reasoning(&completion.content);

        tracing::info!(length = content.len(), usage = completion.usage, "Chat reply received");
        Ok(ChatReply {
            content,
            usage: completion.usage,
        })
    }

    /// Condense a conversation into a short model-generation prompt.
    pub async fn summarize(
        &self,
        conversation: &[IncomingMessage],
    ) -> Result<SummaryReply, ChatApiError> {
        tracing::info!(
            message_count = conversation.len(),
            "Generating design summary"
        );

        let completion = self
            .backend
            .complete(&summary_request(conversation), SUMMARY_SAMPLING)
            .await?;
        let summary = strip_reasoning(&completion.content);

        tracing::info!(length = summary.len(), usage = completion.usage, "Design summary generated");
        Ok(SummaryReply {
            summary,
            usage: completion.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::{Completion, SamplingParams};
    use crate::messages::{ChatMessage, Role};

    /// Records every request and answers with a canned reply.
    struct Recording {
        reply: String,
        seen: Mutex<Vec<(Vec<ChatMessage>, SamplingParams)>>,
    }

    #[async_trait]
    impl ChatBackend for Recording {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            params: SamplingParams,
        ) -> Result<Completion, ChatApiError> {
            self.seen.lock().unwrap().push((messages.to_vec(), params));
            Ok(Completion {
                content: self.reply.clone(),
                usage: 7,
            })
        }
    }

    fn recording(reply: &str) -> Arc<Recording> {
        Arc::new(Recording {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn user(text: &str) -> IncomingMessage {
        IncomingMessage {
            role: Some("user".into()),
            content: Some(text.into()),
        }
    }

    #[tokio::test]
    async fn chat_strips_reasoning_and_uses_chat_sampling() {
        let backend = recording("<think>ponder</think>Go with suede.");
        let assistant = DesignAssistant::new(backend.clone());

        let reply = assistant.chat(&[user("shoe ideas?")]).await.unwrap();

        assert_eq!(reply.content, "Go with suede.");
        assert_eq!(reply.usage, 7);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].1, CHAT_SAMPLING);
        assert_eq!(seen[0].0[0].role, Role::System);
    }

    #[tokio::test]
    async fn summarize_sends_single_user_prompt() {
        let backend = recording("<think>x</think> A matte black helmet.");
        let assistant = DesignAssistant::new(backend.clone());

        let reply = assistant.summarize(&[user("a helmet")]).await.unwrap();

        assert_eq!(reply.summary, "A matte black helmet.");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].0.len(), 1);
        assert_eq!(seen[0].1, SUMMARY_SAMPLING);
        assert!(seen[0].0[0].content.contains("user: a helmet"));
    }
}
