//! Upstream completion API integration

mod openai_compat;

use thiserror::Error;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider, SamplingParams};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
