//! ChatServer implementation
//!
//! Drives every participant through name negotiation and then through
//! round-robin turns until nobody is left. All interaction is sequential:
//! the server talks to exactly one participant at a time, so a silent
//! participant stalls everyone unless a reply timeout is configured.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::Incoming;
use crate::config::DEFAULT_SHUTDOWN_GRACE;
use crate::error::ProtocolError;
use crate::message::{Announcement, ClientMessage, ServerMessage};
use crate::negotiator::{self, NameOutcome};
use crate::registry::Registry;
use crate::types::ParticipantId;

/// What the scheduler does after one reply line
#[derive(Debug)]
pub enum TurnStep {
    /// Keep reading this participant's replies
    Continue,
    /// The turn is over
    EndTurn,
    /// Protocol violation or lost pipe; the participant must be removed
    Fault(ProtocolError),
}

/// The turn-based chat server
pub struct ChatServer {
    /// Participants in configuration order
    registry: Registry,
    /// Join/chat/leave notices for the server's stdout
    announcements: mpsc::UnboundedSender<Announcement>,
    /// Per-read reply timeout (None = wait forever)
    reply_timeout: Option<Duration>,
    /// How long teardown waits for each child
    shutdown_grace: Duration,
}

impl ChatServer {
    /// Create a new ChatServer over an already populated registry
    pub fn new(registry: Registry, announcements: mpsc::UnboundedSender<Announcement>) -> Self {
        Self {
            registry,
            announcements,
            reply_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Give up on a participant whose reply takes longer than `timeout`
    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the whole session: negotiation, then cycles until nobody is active
    pub async fn run(&mut self) {
        info!("ChatServer started with {} participants", self.registry.len());

        self.negotiate_all_names().await;

        let mut cycles = 0usize;
        while self.registry.active_count() > 0 {
            self.run_cycle().await;
            cycles += 1;
        }

        info!("ChatServer finished after {} cycles", cycles);
    }

    /// Close every channel and reap the participant processes
    pub async fn shutdown(self) {
        self.registry.shutdown(self.shutdown_grace).await;
    }

    /// Negotiate names in registry order
    ///
    /// Each participant is prompted until it is named or rejected.
    pub async fn negotiate_all_names(&mut self) {
        let ids: Vec<ParticipantId> = self.registry.ids().collect();
        for id in ids {
            loop {
                match negotiator::negotiate_name(&mut self.registry, id, self.reply_timeout).await {
                    NameOutcome::Named(name) => {
                        info!("Participant {} is now '{}'", id, name);
                        self.announce(Announcement::Joined { name });
                        break;
                    }
                    NameOutcome::Taken(_) => continue,
                    NameOutcome::Rejected | NameOutcome::Skipped => break,
                }
            }
        }
    }

    /// One turn for each participant active at the start of the cycle
    pub async fn run_cycle(&mut self) {
        for id in self.registry.active_ids() {
            if self.registry.is_active(id) {
                self.take_turn(id).await;
            }
        }
    }

    /// Send `YT:` and handle replies until the turn ends
    pub async fn take_turn(&mut self, id: ParticipantId) {
        debug!("Turn for {}", id);
        self.send_to(id, &ServerMessage::YourTurn).await;

        loop {
            let step = match self.read_reply(id).await {
                Ok(msg) => self.handle_reply(id, msg).await,
                Err(e) => TurnStep::Fault(e),
            };
            match step {
                TurnStep::Continue => continue,
                TurnStep::EndTurn => break,
                TurnStep::Fault(e) => {
                    warn!("Removing participant {}: {}", id, e);
                    self.handle_quit(id).await;
                    break;
                }
            }
        }
    }

    async fn read_reply(&mut self, id: ParticipantId) -> Result<ClientMessage, ProtocolError> {
        let participant = self
            .registry
            .get_mut(id)
            .ok_or(ProtocolError::EndOfStream)?;
        match participant.receive(self.reply_timeout).await? {
            Incoming::Line(line) => ClientMessage::parse(&line),
            Incoming::EndOfStream => Err(ProtocolError::EndOfStream),
        }
    }

    /// Apply one reply command
    pub async fn handle_reply(&mut self, id: ParticipantId, msg: ClientMessage) -> TurnStep {
        match msg {
            ClientMessage::Chat { content } => {
                self.handle_chat(id, content).await;
                TurnStep::Continue
            }
            ClientMessage::Kick { name } => {
                self.handle_kick(&name).await;
                TurnStep::Continue
            }
            ClientMessage::Done => TurnStep::EndTurn,
            ClientMessage::Quit => {
                self.handle_quit(id).await;
                TurnStep::EndTurn
            }
        }
    }

    /// Relay a chat message to everyone else
    async fn handle_chat(&mut self, id: ParticipantId, content: String) {
        let Some(sender) = self.registry.get(id) else {
            return;
        };
        let name = sender.display_name();

        let relay = ServerMessage::Msg {
            from: name.clone(),
            content: content.clone(),
        };
        self.broadcast(&relay, Some(id)).await;
        self.announce(Announcement::Chat { name, content });
    }

    /// Tell the active participant called `name` that it is kicked
    ///
    /// Unknown names are ignored. The target stays active until it stops
    /// answering.
    async fn handle_kick(&mut self, name: &str) {
        let Some(target) = self.registry.find_active_by_name(name) else {
            debug!("KICK for unknown participant '{}'", name);
            return;
        };
        info!("Kicking '{}' ({})", name, target);
        self.send_to(target, &ServerMessage::Kick).await;
    }

    /// Deactivate a participant and notify the rest
    ///
    /// Shared by `QUIT:`, protocol faults and end-of-stream.
    pub async fn handle_quit(&mut self, id: ParticipantId) {
        let Some(participant) = self.registry.get_mut(id) else {
            return;
        };
        if !participant.deactivate() {
            return;
        }
        let name = participant.display_name();
        info!("Participant {} ('{}') left", id, name);

        self.broadcast(&ServerMessage::Left { name: name.clone() }, Some(id))
            .await;
        self.announce(Announcement::Left { name });
    }

    /// Send to every active participant except `exclude`, in registry order
    ///
    /// A failed send to one participant does not stop the others.
    pub async fn broadcast(&mut self, msg: &ServerMessage, exclude: Option<ParticipantId>) {
        for id in self.registry.active_ids() {
            if Some(id) != exclude {
                self.send_to(id, msg).await;
            }
        }
    }

    /// Send to one participant, absorbing write failures
    ///
    /// A dead peer is detected when its reply is read.
    async fn send_to(&mut self, id: ParticipantId, msg: &ServerMessage) {
        let Some(participant) = self.registry.get_mut(id) else {
            return;
        };
        if let Err(e) = participant.send(msg).await {
            debug!("Send to {} failed: {}", id, e);
        }
    }

    fn announce(&self, announcement: Announcement) {
        if self.announcements.send(announcement).is_err() {
            debug!("Announcement receiver closed");
        }
    }
}
