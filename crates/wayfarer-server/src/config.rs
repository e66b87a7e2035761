//! Server configuration, read from the environment.
//!
//! Collaborator backends degrade gracefully: without an LLM key the mock
//! generator serves drafts, without speech keys the voice endpoint reports
//! itself unconfigured, and without an identity-provider URL accounts live
//! in process memory (useful for local development only).

use std::env;
use std::time::Duration;

/// Timeout applied to every external collaborator call.
pub const COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// OpenAI-compatible endpoint for plan generation.
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Baidu short-speech credentials.
    pub baidu_api_key: Option<String>,
    pub baidu_secret_key: Option<String>,
    /// Identity provider (GoTrue-style) base URL and anon key.
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,
    /// Hex-encoded HMAC secret for session cookies. Generated at startup
    /// when unset, which invalidates sessions across restarts.
    pub session_secret: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "deepseek-chat".to_owned()),
            baidu_api_key: env::var("BAIDU_API_KEY").ok(),
            baidu_secret_key: env::var("BAIDU_SECRET_KEY").ok(),
            auth_url: env::var("WAYFARER_AUTH_URL").ok(),
            auth_anon_key: env::var("WAYFARER_AUTH_ANON_KEY").ok(),
            session_secret: env::var("WAYFARER_SESSION_SECRET").ok(),
        }
    }
}
