//! Recruit persona prompts
//!
//! The built-in persona covers the demo. A deployment can swap the voice by
//! pointing `PERSONA_FILE` at a TOML template.
//!
//! # Example Persona File
//!
//! ```toml
//! [persona]
//! name = "Quiet QB"
//! description = "A reserved quarterback who answers in short sentences"
//!
//! [system_prompt]
//! content = """
//! You are a college quarterback recruit...
//! """
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// A persona/prompt template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Persona metadata
    pub persona: PersonaInfo,

    /// The system prompt
    pub system_prompt: SystemPrompt,
}

/// Persona metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInfo {
    /// Display name of the persona
    pub name: String,

    /// Brief description
    #[serde(default)]
    pub description: String,
}

/// System prompt content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// The full system prompt content
    pub content: String,
}

impl PromptTemplate {
    /// Load a template directly from a file path
    pub async fn load_from_file(path: &Path) -> Result<Self, PromptError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, PromptError> {
        let template: PromptTemplate =
            toml::from_str(content).map_err(|e| PromptError::ParseError(e.to_string()))?;

        if template.system_prompt.content.trim().is_empty() {
            return Err(PromptError::EmptyPrompt(template.persona.name));
        }

        Ok(template)
    }
}

/// Resolve the system prompt for the recruit: the persona file if one is
/// configured, the built-in persona otherwise.
pub async fn resolve_system_prompt(persona_file: Option<&Path>) -> Result<String, PromptError> {
    match persona_file {
        Some(path) => {
            let template = PromptTemplate::load_from_file(path).await?;
            tracing::info!("Loaded persona '{}' from {}", template.persona.name, path.display());
            Ok(template.system_prompt.content.trim().to_string())
        }
        None => Ok(builtin::RECRUIT.to_string()),
    }
}

/// Errors from prompt loading
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Persona '{0}' has an empty system prompt")]
    EmptyPrompt(String),
}

/// Built-in prompts that don't require files
pub mod builtin {
    /// Default recruit voice
    pub const RECRUIT: &str = "You are a college recruit. Reply in first person, short and candid, with a friendly and informal tone. Ask one follow-up question when appropriate. Keep replies concise (20-80 words).";
}
