/// Default base URL of the Meshy OpenAPI v2.
pub const DEFAULT_MESHY_API_URL: &str = "https://api.meshy.ai/openapi/v2";

/// Connection settings for the generation service.
#[derive(Clone)]
pub struct MeshyConfig {
    /// Bearer token sent with every task request.
    pub api_key: String,
    /// Base URL, without a trailing slash.
    pub api_url: String,
}

impl MeshyConfig {
    /// Load from the environment.
    ///
    /// | Env Var          | Default                              |
    /// |------------------|--------------------------------------|
    /// | `MESHY_API_KEY`  | none, must be set and non-blank      |
    /// | `MESHY_API_URL`  | `https://api.meshy.ai/openapi/v2`    |
    pub fn from_env() -> Self {
        let api_key = std::env::var("MESHY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .expect("MESHY_API_KEY must be set");

        let api_url = std::env::var("MESHY_API_URL")
            .unwrap_or_else(|_| DEFAULT_MESHY_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        Self { api_key, api_url }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for MeshyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshyConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}
