//! Reply engine
//!
//! For each request the engine:
//! 1. Rejects requests without a player or a coach message
//! 2. Builds the message list: persona, player identity, recent turns, new message
//! 3. Calls the completion API exactly once
//! 4. Returns the trimmed completion text

use crate::conversation::{Message, ReplyRequest, CONTEXT_WINDOW};
use crate::providers::{OpenAICompatProvider, ProviderError};

/// Errors from the reply engine
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("Missing playerId or latestCoachMessage")]
    MissingFields,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub struct ReplyEngine {
    provider: OpenAICompatProvider,
    system_prompt: String,
}

impl ReplyEngine {
    pub fn new(provider: OpenAICompatProvider, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Produce the recruit's reply to the latest coach message.
    pub async fn reply(&self, request: &ReplyRequest) -> Result<String, ReplyError> {
        validate(request)?;

        let messages = self.build_messages(request);
        tracing::debug!(
            player_id = %request.player_id,
            history = request.conversation.len(),
            messages = messages.len(),
            "Requesting recruit reply"
        );

        let reply = self.provider.complete(&messages).await?;
        Ok(reply)
    }

    /// Assemble the upstream message list. Only the last [`CONTEXT_WINDOW`]
    /// history turns are used, whatever the client sent.
    pub fn build_messages(&self, request: &ReplyRequest) -> Vec<Message> {
        let history = &request.conversation;
        let recent = &history[history.len().saturating_sub(CONTEXT_WINDOW)..];

        let mut messages = Vec::with_capacity(recent.len() + 3);
        messages.push(Message::system(self.system_prompt.as_str()));
        messages.push(Message::system(format!("Player ID: {}", request.player_id)));
        messages.extend(recent.iter().map(Message::from));
        messages.push(Message::user(request.latest_coach_message.as_str()));
        messages
    }
}

fn validate(request: &ReplyRequest) -> Result<(), ReplyError> {
    if request.player_id.trim().is_empty() || request.latest_coach_message.trim().is_empty() {
        return Err(ReplyError::MissingFields);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompts::builtin;
    use crate::conversation::{Role, Turn};
    use crate::providers::{OpenAICompatConfig, SamplingParams};
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(api_url: String) -> ReplyEngine {
        let provider = OpenAICompatProvider::new(OpenAICompatConfig {
            api_url,
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
            sampling: SamplingParams::default(),
        })
        .unwrap();
        ReplyEngine::new(provider, builtin::RECRUIT)
    }

    fn request_with_history(turns: usize) -> ReplyRequest {
        ReplyRequest {
            player_id: "mendoza".to_string(),
            conversation: (0..turns)
                .map(|i| {
                    if i % 2 == 0 {
                        Turn::player(format!("turn {}", i))
                    } else {
                        Turn::recruiter(format!("turn {}", i))
                    }
                })
                .collect(),
            latest_coach_message: "Want to visit campus?".to_string(),
        }
    }

    #[test]
    fn test_message_order() {
        let engine = engine_for("http://127.0.0.1:9/unused".to_string());
        let messages = engine.build_messages(&request_with_history(2));

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], Message::system(builtin::RECRUIT));
        assert_eq!(messages[1], Message::system("Player ID: mendoza"));
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "turn 0");
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[4], Message::user("Want to visit campus?"));
    }

    #[test]
    fn test_history_truncated_to_window() {
        let engine = engine_for("http://127.0.0.1:9/unused".to_string());
        let messages = engine.build_messages(&request_with_history(10));

        // persona + identity + 8 turns + new message
        assert_eq!(messages.len(), 11);
        assert_eq!(messages[2].content, "turn 2");
        assert_eq!(messages[9].content, "turn 9");
    }

    #[tokio::test]
    async fn test_missing_fields_skip_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let engine = engine_for(server.uri());

        let mut no_message = request_with_history(1);
        no_message.latest_coach_message = "   ".to_string();
        assert!(matches!(
            engine.reply(&no_message).await,
            Err(ReplyError::MissingFields)
        ));

        let mut no_player = request_with_history(1);
        no_player.player_id.clear();
        assert!(matches!(
            engine.reply(&no_player).await,
            Err(ReplyError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn test_reply_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "\n Sure, let's talk  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(server.uri());
        let reply = engine.reply(&request_with_history(3)).await.unwrap();
        assert_eq!(reply, "Sure, let's talk");
    }
}
