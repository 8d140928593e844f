//! Design-assistant chat proxy.
//!
//! Forwards role-tagged conversations to an OpenAI-compatible
//! chat-completion API, condenses conversations into short design
//! summaries, and strips model reasoning blocks from every reply.

pub mod api;
pub mod assistant;
pub mod backend;
pub mod config;
pub mod messages;
pub mod prompts;
pub mod reasoning;

pub use api::{ChatApi, ChatApiError};
pub use assistant::{ChatReply, DesignAssistant, SummaryReply};
pub use backend::{ChatBackend, Completion, SamplingParams};
pub use config::ChatConfig;
pub use messages::{ChatMessage, IncomingMessage, Role};
