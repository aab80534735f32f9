//! Participant-side protocol handler
//!
//! Runs inside a participant process: reads server commands from the
//! channel (stdin/stdout in the real binaries), answers name negotiation,
//! hands turns and chat messages to a `Behavior`, and decides how the
//! process exits.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::channel::{Channel, Incoming};
use crate::codec;
use crate::message::{Announcement, ServerMessage, NAME};
use crate::types::ParticipantExit;

/// Lines to emit for one turn
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnPlan {
    /// Protocol lines, in order, without newlines
    pub lines: Vec<String>,
    /// Exit normally once the lines are written
    pub leave: bool,
}

/// What a participant does with its turns and the chat it hears
pub trait Behavior {
    /// Called on `YT:`
    fn on_turn(&mut self) -> TurnPlan;

    /// Called on `MSG:<from>:<content>`; `own_name` is the current name
    fn on_message(&mut self, _own_name: &str, _from: &str, _content: &str) {}
}

/// Base name plus the counter bumped by each `NAME_TAKEN:`
///
/// Yields `base`, then `base0`, `base1`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantName {
    base: String,
    counter: Option<u32>,
}

impl ParticipantName {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            counter: None,
        }
    }

    /// Switch to the next candidate name
    pub fn advance(&mut self) {
        self.counter = Some(self.counter.map_or(0, |n| n + 1));
    }
}

impl std::fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.counter {
            None => write!(f, "{}", self.base),
            Some(n) => write!(f, "{}{}", self.base, n),
        }
    }
}

/// Serve the server until kicked, finished, or a protocol error
///
/// `notices` receives the human-readable chat transcript (stderr in the
/// real binaries).
pub async fn run_participant<B, N>(
    behavior: &mut B,
    base_name: &str,
    channel: &mut Channel,
    mut notices: N,
) -> ParticipantExit
where
    B: Behavior,
    N: AsyncWrite + Unpin,
{
    let mut name = ParticipantName::new(base_name);

    loop {
        let line = match channel.receive_line().await {
            Ok(Incoming::Line(line)) => line,
            Ok(Incoming::EndOfStream) => {
                debug!("Server closed the pipe");
                return ParticipantExit::CommsError;
            }
            Err(e) => {
                warn!("Reading from server failed: {}", e);
                return ParticipantExit::CommsError;
            }
        };

        let msg = match ServerMessage::parse(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Bad line from server {:?}: {}", line, e);
                return ParticipantExit::CommsError;
            }
        };

        match msg {
            ServerMessage::Who => {
                let reply = codec::encode(&[NAME.to_string(), name.to_string()]);
                if let Err(e) = channel.send_line(&reply).await {
                    warn!("Sending name failed: {}", e);
                    return ParticipantExit::CommsError;
                }
            }
            ServerMessage::NameTaken => name.advance(),
            ServerMessage::YourTurn => {
                let plan = behavior.on_turn();
                for line in &plan.lines {
                    if let Err(e) = channel.send_line(line).await {
                        warn!("Sending turn reply failed: {}", e);
                        return ParticipantExit::CommsError;
                    }
                }
                if plan.leave {
                    return ParticipantExit::Normal;
                }
            }
            ServerMessage::Kick => return ParticipantExit::Kicked,
            ServerMessage::Msg { from, content } => {
                behavior.on_message(&name.to_string(), &from, &content);
                notice(&mut notices, Announcement::Chat { name: from, content }).await;
            }
            ServerMessage::Left { name: who } => {
                notice(&mut notices, Announcement::Left { name: who }).await;
            }
        }
    }
}

async fn notice<N: AsyncWrite + Unpin>(notices: &mut N, announcement: Announcement) {
    let line = format!("{}\n", announcement);
    if let Err(e) = notices.write_all(line.as_bytes()).await {
        debug!("Writing notice failed: {}", e);
        return;
    }
    if let Err(e) = notices.flush().await {
        debug!("Flushing notice failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    /// Replies CHAT:<n> on each turn, remembers what it heard
    #[derive(Default)]
    struct Echo {
        turns: usize,
        leave_after: Option<usize>,
        heard: Vec<(String, String, String)>,
    }

    impl Behavior for Echo {
        fn on_turn(&mut self) -> TurnPlan {
            self.turns += 1;
            TurnPlan {
                lines: vec![format!("CHAT:turn {}", self.turns), "DONE:".into()],
                leave: self.leave_after == Some(self.turns),
            }
        }

        fn on_message(&mut self, own_name: &str, from: &str, content: &str) {
            self.heard
                .push((own_name.to_string(), from.to_string(), content.to_string()));
        }
    }

    /// Feed `input` to a participant; returns its exit, output lines and notices
    async fn drive(behavior: &mut Echo, input: &str) -> (ParticipantExit, Vec<String>, String) {
        let (ours, theirs) = tokio::io::duplex(4096);
        let (r, w) = tokio::io::split(ours);
        let mut channel = Channel::from_streams(r, w, "server");

        let (server_read, mut server_write) = tokio::io::split(theirs);
        server_write.write_all(input.as_bytes()).await.unwrap();
        server_write.shutdown().await.unwrap();

        let mut notices = Vec::new();
        let exit = run_participant(behavior, "client", &mut channel, &mut notices).await;
        drop(channel);

        let mut output = Vec::new();
        let mut lines = BufReader::new(server_read).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            output.push(line);
        }
        (exit, output, String::from_utf8(notices).unwrap())
    }

    #[test]
    fn test_name_sequence() {
        let mut name = ParticipantName::new("clientbot");
        assert_eq!(name.to_string(), "clientbot");
        name.advance();
        assert_eq!(name.to_string(), "clientbot0");
        name.advance();
        assert_eq!(name.to_string(), "clientbot1");
    }

    #[tokio::test]
    async fn test_name_taken_advances_name() {
        let mut echo = Echo::default();
        let (exit, output, _) = drive(&mut echo, "WHO:\nNAME_TAKEN:\nWHO:\nKICK:\n").await;
        assert_eq!(exit, ParticipantExit::Kicked);
        assert_eq!(output, vec!["NAME:client", "NAME:client0"]);
    }

    #[tokio::test]
    async fn test_turn_lines_are_written() {
        let mut echo = Echo {
            leave_after: Some(2),
            ..Default::default()
        };
        let (exit, output, _) = drive(&mut echo, "WHO:\nYT:\nYT:\nYT:\n").await;
        assert_eq!(exit, ParticipantExit::Normal);
        assert_eq!(
            output,
            vec!["NAME:client", "CHAT:turn 1", "DONE:", "CHAT:turn 2", "DONE:"]
        );
    }

    #[tokio::test]
    async fn test_messages_reach_behavior_and_notices() {
        let mut echo = Echo::default();
        let (exit, _, notices) =
            drive(&mut echo, "WHO:\nMSG:bob:hi there\nLEFT:bob\nKICK:\n").await;
        assert_eq!(exit, ParticipantExit::Kicked);
        assert_eq!(
            echo.heard,
            vec![("client".to_string(), "bob".to_string(), "hi there".to_string())]
        );
        assert_eq!(notices, "(bob) hi there\n(bob has left the chat)\n");
    }

    #[tokio::test]
    async fn test_bad_server_line_is_comms_error() {
        for input in ["YT\n", "MSG:bob\n", "HELLO:\n", "\n"] {
            let mut echo = Echo::default();
            let (exit, _, _) = drive(&mut echo, input).await;
            assert_eq!(exit, ParticipantExit::CommsError, "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_end_of_input_is_comms_error() {
        let mut echo = Echo::default();
        let (exit, output, _) = drive(&mut echo, "WHO:\n").await;
        assert_eq!(exit, ParticipantExit::CommsError);
        assert_eq!(output, vec!["NAME:client"]);
    }
}
