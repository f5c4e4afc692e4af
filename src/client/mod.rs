//! Coach-side chat client
//!
//! The [`SendOrchestrator`] drives one chat session: it keeps the
//! conversation store, allows a single message in flight at a time, and turns
//! every outcome of a send into a player turn. Technical failures never reach
//! the conversation; they become scripted in-character lines instead.

pub mod terminal;
mod transport;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::conversation::{ConversationStore, ReplyRequest, Turn, CONTEXT_WINDOW};
use crate::roster::Player;

pub use transport::{HttpReplyTransport, ReplyTransport, TransportError, TransportResponse};

/// Player line used when the proxy answers with a non-success status
pub const TROUBLE_RECEIVING: &str = "Sorry coach, I had trouble receiving that. Can you repeat?";

/// Player line used when the proxy succeeds without reply text
pub const ACKNOWLEDGEMENT: &str = "Thanks coach, I appreciate the message.";

/// Player line used when the request never completed
pub const NETWORK_FALLBACK: &str =
    "Hey coach, looks like I couldn't get your message. Can you try again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
}

/// The UI the orchestrator drives
pub trait ChatView: Send + Sync {
    /// Show the full conversation with `player`.
    fn render(&self, player: &Player, turns: &[Turn]);

    fn clear_input(&self);

    /// Disable (true) or re-enable (false) the input and send controls.
    fn set_sending(&self, sending: bool);

    fn focus_input(&self);
}

/// What a call to [`SendOrchestrator::submit`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    NoActivePlayer,
    AlreadySending,
    EmptyInput,
    /// The recruit's reply was appended verbatim
    Replied,
    /// Success without reply text; the acknowledgement line was appended
    Acknowledged,
    /// The proxy returned a non-success status
    UpstreamFallback { status: u16 },
    /// The request never completed
    NetworkFallback,
}

impl SubmitOutcome {
    /// Whether a request was actually sent to the proxy
    pub fn was_sent(&self) -> bool {
        !matches!(
            self,
            SubmitOutcome::NoActivePlayer | SubmitOutcome::AlreadySending | SubmitOutcome::EmptyInput
        )
    }
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: Option<String>,
}

/// Reply text from a success body, if there is any
fn parse_reply(body: &str) -> Option<String> {
    serde_json::from_str::<ReplyBody>(body)
        .ok()
        .and_then(|b| b.reply)
        .filter(|reply| !reply.is_empty())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the `Sending` state. Dropping it always returns to `Idle` and hands
/// the input back, whichever way the send ended.
struct SendingGuard<'a, V: ChatView> {
    state: &'a Mutex<SendState>,
    view: &'a V,
}

impl<'a, V: ChatView> SendingGuard<'a, V> {
    fn enter(state: &'a Mutex<SendState>, view: &'a V) -> Option<Self> {
        {
            let mut current = lock(state);
            if *current == SendState::Sending {
                return None;
            }
            *current = SendState::Sending;
        }
        view.set_sending(true);
        Some(Self { state, view })
    }
}

impl<V: ChatView> Drop for SendingGuard<'_, V> {
    fn drop(&mut self) {
        *lock(self.state) = SendState::Idle;
        self.view.set_sending(false);
        self.view.focus_input();
    }
}

pub struct SendOrchestrator<T, V> {
    store: Arc<Mutex<ConversationStore>>,
    transport: T,
    view: V,
    active: Mutex<Option<&'static Player>>,
    state: Mutex<SendState>,
}

impl<T: ReplyTransport, V: ChatView> SendOrchestrator<T, V> {
    pub fn new(store: Arc<Mutex<ConversationStore>>, transport: T, view: V) -> Self {
        Self {
            store,
            transport,
            view,
            active: Mutex::new(None),
            state: Mutex::new(SendState::Idle),
        }
    }

    pub fn state(&self) -> SendState {
        *lock(&self.state)
    }

    pub fn active_player(&self) -> Option<&'static Player> {
        *lock(&self.active)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Switch the chat to `player`, starting the conversation if needed.
    pub fn open(&self, player: &'static Player) {
        *lock(&self.active) = Some(player);
        lock(&self.store).ensure(player.id);
        self.render(player);
        self.view.focus_input();
    }

    /// Send the coach's message to the active player.
    ///
    /// Nothing happens when no player is open, a send is already in flight,
    /// or the trimmed input is empty. Otherwise the coach turn is shown
    /// before the request goes out, and exactly one player turn is appended
    /// when it completes.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let Some(player) = self.active_player() else {
            return SubmitOutcome::NoActivePlayer;
        };
        if self.state() == SendState::Sending {
            return SubmitOutcome::AlreadySending;
        }
        let text = input.trim();
        if text.is_empty() {
            return SubmitOutcome::EmptyInput;
        }
        let Some(_sending) = SendingGuard::enter(&self.state, &self.view) else {
            return SubmitOutcome::AlreadySending;
        };

        let request = {
            let mut store = lock(&self.store);
            let window = store.recent_window(player.id, CONTEXT_WINDOW);
            store.append(player.id, Turn::recruiter(text));
            ReplyRequest {
                player_id: player.id.to_string(),
                conversation: window,
                latest_coach_message: text.to_string(),
            }
        };
        self.render(player);
        self.view.clear_input();

        let (turn, outcome) = match self.transport.post_reply(&request).await {
            Ok(response) if !response.is_success() => {
                tracing::error!(
                    status = response.status,
                    body = %response.body,
                    "Server returned error"
                );
                (
                    Turn::player(TROUBLE_RECEIVING),
                    SubmitOutcome::UpstreamFallback {
                        status: response.status,
                    },
                )
            }
            Ok(response) => match parse_reply(&response.body) {
                Some(reply) => (Turn::player(reply), SubmitOutcome::Replied),
                None => (Turn::player(ACKNOWLEDGEMENT), SubmitOutcome::Acknowledged),
            },
            Err(e) => {
                tracing::error!("Network or unexpected error while sending message: {}", e);
                (Turn::player(NETWORK_FALLBACK), SubmitOutcome::NetworkFallback)
            }
        };

        lock(&self.store).append(player.id, turn);
        self.render(player);
        outcome
    }

    fn render(&self, player: &Player) {
        let store = lock(&self.store);
        self.view.render(player, store.turns(player.id));
    }
}
