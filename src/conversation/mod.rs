//! Conversation types and state management

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of most recent turns sent upstream as context
pub const CONTEXT_WINDOW: usize = 8;

/// Scripted line every conversation opens with
pub const OPENING_LINE: &str = "Hey, what's up coach? Thanks for reaching out.";

/// A role-tagged message in the upstream completion format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Player,
    Recruiter,
}

impl Speaker {
    /// Coach turns are the prompting side, player turns are the model's own voice.
    pub fn role(self) -> Role {
        match self {
            Speaker::Recruiter => Role::User,
            Speaker::Player => Role::Assistant,
        }
    }
}

/// One line of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub who: Speaker,
    pub text: String,
}

impl Turn {
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            who: Speaker::Player,
            text: text.into(),
        }
    }

    pub fn recruiter(text: impl Into<String>) -> Self {
        Self {
            who: Speaker::Recruiter,
            text: text.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.who.role(),
            content: turn.text.clone(),
        }
    }
}

/// Body of `POST /api/recruit/reply`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub conversation: Vec<Turn>,
    #[serde(default)]
    pub latest_coach_message: String,
}

/// Successful proxy reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// Per-player turn history for one session.
///
/// Histories are created lazily and never removed; only the window handed to
/// the proxy is bounded.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<String, Vec<Turn>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the player's history with the opening line if it has none yet.
    pub fn ensure(&mut self, player_id: &str) {
        self.conversations
            .entry(player_id.to_string())
            .or_insert_with(|| vec![Turn::player(OPENING_LINE)]);
    }

    pub fn append(&mut self, player_id: &str, turn: Turn) {
        self.conversations
            .entry(player_id.to_string())
            .or_default()
            .push(turn);
    }

    /// The last `n` turns in chronological order, copied out of the store.
    pub fn recent_window(&self, player_id: &str, n: usize) -> Vec<Turn> {
        let turns = self.turns(player_id);
        turns[turns.len().saturating_sub(n)..].to_vec()
    }

    pub fn turns(&self, player_id: &str) -> &[Turn] {
        self.conversations
            .get(player_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
