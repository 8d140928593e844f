/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_CHAT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Default completion model.
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Connection settings for the chat-completion service.
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: String,
    /// Base URL, without a trailing slash.
    pub api_url: String,
    pub model: String,
}

impl ChatConfig {
    /// Load from the environment.
    ///
    /// | Env Var         | Default                           |
    /// |-----------------|-----------------------------------|
    /// | `CHAT_API_KEY`  | none, must be set and non-blank   |
    /// | `CHAT_API_URL`  | `https://api.groq.com/openai/v1`  |
    /// | `CHAT_MODEL`    | `deepseek-r1-distill-llama-70b`   |
    pub fn from_env() -> Self {
        let api_key = std::env::var("CHAT_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .expect("CHAT_API_KEY must be set");

        let api_url = std::env::var("CHAT_API_URL")
            .unwrap_or_else(|_| DEFAULT_CHAT_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.into());

        Self {
            api_key,
            api_url,
            model,
        }
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}
