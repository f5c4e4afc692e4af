//! Line-oriented terminal front end for the chat client

use std::io::Write;
use std::sync::Mutex;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{lock, ChatView, ReplyTransport, SendOrchestrator};
use crate::conversation::{Speaker, Turn};
use crate::roster::{self, Player};

const PROMPT: &str = "coach> ";

#[derive(Default)]
struct Shown {
    player: Option<String>,
    turns: usize,
}

/// Prints the conversation to a writer, only appending what is new
pub struct TerminalView<W> {
    out: Mutex<W>,
    shown: Mutex<Shown>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            shown: Mutex::new(Shown::default()),
        }
    }

    fn write_turn(out: &mut W, player: &Player, turn: &Turn) {
        let speaker = match turn.who {
            Speaker::Player => player.name,
            Speaker::Recruiter => "Coach",
        };
        writeln!(out, "{}: {}", speaker, turn.text).ok();
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn render(&self, player: &Player, turns: &[Turn]) {
        let mut shown = lock(&self.shown);
        let mut out = lock(&self.out);

        if shown.player.as_deref() != Some(player.id) {
            writeln!(out, "\n== {} ==", player).ok();
            shown.player = Some(player.id.to_string());
            shown.turns = 0;
        }

        for turn in turns.iter().skip(shown.turns) {
            Self::write_turn(&mut out, player, turn);
        }
        shown.turns = turns.len();
        out.flush().ok();
    }

    fn clear_input(&self) {
        // the submitted line has already been consumed from stdin
    }

    fn set_sending(&self, sending: bool) {
        if sending {
            let mut out = lock(&self.out);
            writeln!(out, "  (sending...)").ok();
            out.flush().ok();
        }
    }

    fn focus_input(&self) {
        let mut out = lock(&self.out);
        write!(out, "{}", PROMPT).ok();
        out.flush().ok();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Players,
    Switch(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed.split_once(' ') {
            Some(("/switch", id)) => Command::Switch(id.trim()),
            _ => match trimmed {
                "/quit" | "/exit" => Command::Quit,
                "/players" => Command::Players,
                _ => Command::Message(line),
            },
        }
    }
}

pub fn print_roster(out: &mut impl Write) -> std::io::Result<()> {
    for player in roster::PLAYERS {
        writeln!(out, "{:<8} {}", player.id, player)?;
    }
    Ok(())
}

/// Read coach input line by line until EOF or `/quit`.
///
/// `/switch <id>` moves to another recruit; `/players` lists the roster.
/// Each line waits for its reply before the next is read, so at most one
/// message is ever in flight.
pub async fn run<T, V, R>(orchestrator: &SendOrchestrator<T, V>, input: R) -> std::io::Result<()>
where
    T: ReplyTransport,
    V: ChatView,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Players => {
                print_roster(&mut std::io::stdout())?;
                orchestrator.view().focus_input();
            }
            Command::Switch(id) => match roster::find(id) {
                Some(player) => orchestrator.open(player),
                None => {
                    eprintln!("Unknown player '{}'. Try /players.", id);
                    orchestrator.view().focus_input();
                }
            },
            Command::Message(text) => {
                let outcome = orchestrator.submit(text).await;
                tracing::debug!(?outcome, "Submit finished");
                if !outcome.was_sent() {
                    orchestrator.view().focus_input();
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpReplyTransport;
    use crate::conversation::{ConversationStore, OPENING_LINE};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn output(view: &TerminalView<Vec<u8>>) -> String {
        String::from_utf8(lock(&view.out).clone()).unwrap()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse(" /players "), Command::Players);
        assert_eq!(Command::parse("/switch  bain"), Command::Switch("bain"));
        assert_eq!(Command::parse("hello there"), Command::Message("hello there"));
    }

    #[test]
    fn test_render_only_prints_new_turns() {
        let view = TerminalView::new(Vec::new());
        let player = roster::find("moore").unwrap();

        let mut turns = vec![Turn::player(OPENING_LINE)];
        view.render(player, &turns);
        turns.push(Turn::recruiter("Hi Dante"));
        view.render(player, &turns);

        let printed = output(&view);
        assert_eq!(printed.matches(OPENING_LINE).count(), 1);
        assert_eq!(printed.matches("== Dante Moore").count(), 1);
        assert!(printed.contains("Coach: Hi Dante"));
    }

    #[test]
    fn test_switching_player_prints_new_header() {
        let view = TerminalView::new(Vec::new());
        let turns = vec![Turn::player(OPENING_LINE)];

        view.render(roster::find("moore").unwrap(), &turns);
        view.render(roster::find("tucker").unwrap(), &turns);

        let printed = output(&view);
        assert!(printed.contains("== T. Tucker"));
        assert_eq!(printed.matches(OPENING_LINE).count(), 2);
    }

    #[tokio::test]
    async fn test_run_session() {
        let proxy = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"reply": "Appreciate it, coach."})),
            )
            .expect(1)
            .mount(&proxy)
            .await;

        let orchestrator = SendOrchestrator::new(
            Arc::new(Mutex::new(ConversationStore::new())),
            HttpReplyTransport::new(&proxy.uri()),
            TerminalView::new(Vec::new()),
        );
        orchestrator.open(roster::find("sellers").unwrap());

        let input: &[u8] = b"   \nGreat game Saturday\n/switch nobody\n/quit\nnever sent\n";
        run(&orchestrator, input).await.unwrap();

        let printed = output(orchestrator.view());
        assert!(printed.contains("Coach: Great game Saturday"));
        assert!(printed.contains("LaNorris Sellers: Appreciate it, coach."));
        assert!(!printed.contains("never sent"));
    }
}
