//! Application configuration

pub mod prompts;

use std::env;
use std::fmt;
use std::path::PathBuf;

pub use prompts::{resolve_system_prompt, PromptError};

/// Default OpenAI-compatible chat completions endpoint
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default completion model
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing OPENAI_API_KEY in environment. Add it to .env and restart.")]
    MissingApiKey,
}

/// Process-wide settings, fixed at startup
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ai_api_url: String,
    pub openai_api_key: String,
    pub ai_model: String,
    /// Global request ceiling per rolling minute, across all callers
    pub rate_limit_per_minute: u32,
    pub upstream_timeout_secs: u64,
    /// Optional TOML persona overriding the built-in recruit prompt
    pub persona_file: Option<PathBuf>,
    /// Directory holding the browser client bundle, served if present
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Only the API key is mandatory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            ai_api_url: lookup("AI_API_URL").unwrap_or_else(|| DEFAULT_AI_API_URL.into()),
            openai_api_key,
            ai_model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.into()),
            rate_limit_per_minute: lookup("RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
            upstream_timeout_secs: lookup("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            persona_file: lookup("PERSONA_FILE").map(PathBuf::from),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ai_api_url", &self.ai_api_url)
            .field("openai_api_key", &"<redacted>")
            .field("ai_model", &self.ai_model)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("persona_file", &self.persona_file)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}
