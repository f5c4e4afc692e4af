//! OpenAI-compatible provider
//!
//! Sends one chat completion request per reply. Works with any endpoint that
//! speaks the OpenAI chat completions format (OpenAI, Groq, vLLM, LM Studio).
//! Older completion-style servers answer with `choices[].text` instead of
//! `choices[].message.content`; both shapes are accepted.
//!
//! # Configuration
//!
//! ```text
//! AI_API_URL=https://api.openai.com/v1/chat/completions
//! OPENAI_API_KEY=sk-...
//! AI_MODEL=gpt-4o-mini
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::conversation::{Message, Role};

use super::ProviderError;

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: msg.content.clone(),
        }
    }
}

/// Fixed sampling settings sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 220,
            top_p: 0.95,
            frequency_penalty: 0.2,
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
}

/// Chat completion response, lenient about which shape each choice uses
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Where the completion text was found
#[derive(Debug, PartialEq)]
enum CompletionText {
    /// `choices[0].message.content`
    Chat(String),
    /// `choices[0].text`
    Legacy(String),
    Empty,
}

impl CompletionText {
    fn from_response(response: ChatCompletionResponse) -> Self {
        let Some(choice) = response.choices.into_iter().next() else {
            return CompletionText::Empty;
        };

        if let Some(content) = choice.message.and_then(|m| m.content) {
            return CompletionText::Chat(content);
        }

        match choice.text {
            Some(text) => CompletionText::Legacy(text),
            None => CompletionText::Empty,
        }
    }

    fn into_reply(self) -> String {
        match self {
            CompletionText::Chat(text) | CompletionText::Legacy(text) => text.trim().to_string(),
            CompletionText::Empty => String::new(),
        }
    }
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Full chat completions URL
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub sampling: SamplingParams,
}

impl OpenAICompatConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.ai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.ai_model.clone(),
            timeout_secs: config.upstream_timeout_secs,
            sampling: SamplingParams::default(),
        }
    }
}

/// OpenAI-compatible API provider
#[derive(Debug)]
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one chat completion request and return the trimmed reply text.
    ///
    /// A non-success status comes back as [`ProviderError::Upstream`] carrying
    /// the provider's body verbatim. There is no retry.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let sampling = self.config.sampling;
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            frequency_penalty: sampling.frequency_penalty,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "AI provider error");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(CompletionText::from_response(completion).into_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decode(value: serde_json::Value) -> CompletionText {
        CompletionText::from_response(serde_json::from_value(value).unwrap())
    }

    fn provider_for(server: &MockServer) -> OpenAICompatProvider {
        OpenAICompatProvider::new(OpenAICompatConfig {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
            sampling: SamplingParams::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_message_conversion() {
        let chat_msg = ChatMessage::from(&Message::user("Hello"));
        assert_eq!(chat_msg.role, "user");
        assert_eq!(chat_msg.content, "Hello");
    }

    #[test]
    fn test_extract_chat_shape() {
        let text = decode(json!({"choices": [{"message": {"content": "  Sure, let's talk \n"}}]}));
        assert_eq!(text, CompletionText::Chat("  Sure, let's talk \n".to_string()));
        assert_eq!(text.into_reply(), "Sure, let's talk");
    }

    #[test]
    fn test_extract_legacy_shape() {
        let text = decode(json!({"choices": [{"text": " legacy reply "}]}));
        assert_eq!(text.into_reply(), "legacy reply");
    }

    #[test]
    fn test_null_content_falls_back_to_text() {
        let text = decode(json!({"choices": [{"message": {"content": null}, "text": "from text"}]}));
        assert_eq!(text, CompletionText::Legacy("from text".to_string()));
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(decode(json!({"choices": []})), CompletionText::Empty);
        assert_eq!(decode(json!({})), CompletionText::Empty);
        assert_eq!(decode(json!({"choices": [{}]})).into_reply(), "");
    }

    #[tokio::test]
    async fn test_complete_sends_fixed_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.8,
                "max_tokens": 220,
                "top_p": 0.95,
                "frequency_penalty": 0.2,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": " Hey coach! "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .complete(&[Message::user("Hello")])
            .await
            .unwrap();
        assert_eq!(reply, "Hey coach!");
    }

    #[tokio::test]
    async fn test_complete_upstream_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&[Message::user("Hello")])
            .await
            .unwrap_err();

        match err {
            ProviderError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&[Message::user("Hello")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
