//! Fixed prompts and the message shaping applied before every upstream call.

use crate::messages::{ChatMessage, IncomingMessage, Role};

/// System prompt prepended to conversations that do not bring their own.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a fashion and 3D design expert. Help users refine their design ideas by suggesting improvements, asking clarifying questions, and offering creative suggestions. Focus on:
- Visual design elements
- Color schemes and patterns
- Material suggestions
- Styling options
- Practical considerations

Keep your responses helpful, specific, and tailored to the user's request.";

/// Summary instruction; `{conversation}` is replaced by the rendered transcript.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "Based on this conversation, create a concise 50-word description for generating a 3D model. Focus only on key visual elements, materials, colors, and design features:

{conversation}

Create a 50-word summary focusing only on concrete design elements:";

/// Substituted for missing or empty message content.
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "No content provided";

/// Shape client messages into a valid upstream conversation.
///
/// Unknown or missing roles become `user`, blank content is replaced with
/// [`EMPTY_CONTENT_PLACEHOLDER`], and [`CHAT_SYSTEM_PROMPT`] leads the list
/// unless a system message is already present.
pub fn normalize_chat_messages(incoming: &[IncomingMessage]) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = incoming
        .iter()
        .map(|msg| {
            let role = match msg.role.as_deref().and_then(Role::parse) {
                Some(role) => role,
                None => {
                    tracing::warn!(
                        role = msg.role.as_deref().unwrap_or("missing"),
                        "Invalid message role, defaulting to 'user'",
                    );
                    Role::User
                }
            };
            let content = match msg.content.as_deref() {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => EMPTY_CONTENT_PLACEHOLDER.to_string(),
            };
            ChatMessage::new(role, content)
        })
        .collect();

    if !messages.iter().any(|m| m.role == Role::System) {
        messages.insert(0, ChatMessage::new(Role::System, CHAT_SYSTEM_PROMPT));
    }
    messages
}

/// Render a transcript as `role: content` paragraphs.
pub fn render_conversation(conversation: &[IncomingMessage]) -> String {
    conversation
        .iter()
        .map(|msg| {
            format!(
                "{}: {}",
                msg.role.as_deref().unwrap_or("unknown"),
                msg.content.as_deref().unwrap_or("No content"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The single user message that asks for a design summary.
pub fn summary_request(conversation: &[IncomingMessage]) -> Vec<ChatMessage> {
    let prompt =
        SUMMARY_PROMPT_TEMPLATE.replace("{conversation}", &render_conversation(conversation));
    vec![ChatMessage::new(Role::User, prompt)]
}
