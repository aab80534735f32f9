//! Message protocol definitions
//!
//! Colon-delimited line protocol between the server and its participants.
//! Two closed vocabularies exist, one per direction, each with a fixed
//! field count per command (including the command name itself).

use crate::codec::{self, DecodedLine};
use crate::error::ProtocolError;

/// Which side a command is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server → participant
    ToParticipant,
    /// Participant → server (turn replies)
    ToServer,
}

/// Name and required field count of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub arity: usize,
}

/// Commands legal to a participant, in table order
pub const TO_PARTICIPANT: &[CommandSpec] = &[
    CommandSpec { name: "WHO", arity: 1 },
    CommandSpec { name: "NAME_TAKEN", arity: 1 },
    CommandSpec { name: "YT", arity: 1 },
    CommandSpec { name: "KICK", arity: 1 },
    CommandSpec { name: "MSG", arity: 3 },
    CommandSpec { name: "LEFT", arity: 2 },
];

/// Commands legal to the server during a turn, in table order
///
/// `NAME` is negotiation-only and not listed.
pub const TO_SERVER: &[CommandSpec] = &[
    CommandSpec { name: "CHAT", arity: 2 },
    CommandSpec { name: "KICK", arity: 2 },
    CommandSpec { name: "DONE", arity: 1 },
    CommandSpec { name: "QUIT", arity: 1 },
];

/// Negotiation reply command
pub const NAME: &str = "NAME";

impl Direction {
    /// Command table for this direction
    pub fn table(self) -> &'static [CommandSpec] {
        match self {
            Direction::ToParticipant => TO_PARTICIPANT,
            Direction::ToServer => TO_SERVER,
        }
    }
}

/// Look up a command name (exact, case-sensitive)
///
/// Returns the command's index in the direction's table.
pub fn classify(name: &str, direction: Direction) -> Option<usize> {
    direction.table().iter().position(|spec| spec.name == name)
}

/// Check a decoded line against a direction's table
///
/// Rejects malformed lines, unknown names and wrong field counts.
pub fn validate(line: &DecodedLine, direction: Direction) -> Result<&'static CommandSpec, ProtocolError> {
    let Some(name) = line.name() else {
        return Err(ProtocolError::Empty);
    };
    if line.malformed {
        return Err(ProtocolError::Malformed(name.to_string()));
    }
    let index =
        classify(name, direction).ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))?;
    let spec = &direction.table()[index];
    if spec.arity != line.len() {
        return Err(ProtocolError::WrongArity {
            command: spec.name,
            expected: spec.arity,
            found: line.len(),
        });
    }
    Ok(spec)
}

/// Participant → Server message (turn replies)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Broadcast a chat message
    Chat { content: String },
    /// Ask the server to remove the named participant
    Kick { name: String },
    /// End of turn
    Done,
    /// Leave voluntarily
    Quit,
}

impl ClientMessage {
    /// Decode and validate one reply line
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let line = codec::decode(raw);
        let spec = validate(&line, Direction::ToServer)?;
        let arg = |i| line.arg(i).unwrap_or_default().to_string();
        Ok(match spec.name {
            // An empty body would relay as `MSG:<name>:`, which decodes short
            "CHAT" if line.arg(0) == Some("") => return Err(ProtocolError::EmptyMessage),
            "CHAT" => ClientMessage::Chat { content: arg(0) },
            "KICK" => ClientMessage::Kick { name: arg(0) },
            "DONE" => ClientMessage::Done,
            _ => ClientMessage::Quit,
        })
    }

    /// Wire form without the newline
    pub fn to_line(&self) -> String {
        match self {
            ClientMessage::Chat { content } => codec::encode(&["CHAT", content.as_str()]),
            ClientMessage::Kick { name } => codec::encode(&["KICK", name.as_str()]),
            ClientMessage::Done => codec::encode(&["DONE"]),
            ClientMessage::Quit => codec::encode(&["QUIT"]),
        }
    }
}

/// Decode the reply to `WHO:`
///
/// Only the exact form `NAME:<name>` with a non-empty name is accepted.
pub fn parse_name_reply(raw: &str) -> Result<String, ProtocolError> {
    let line = codec::decode(raw);
    match line.name() {
        None => Err(ProtocolError::Empty),
        Some(NAME) if line.len() == 2 => match line.arg(0) {
            Some("") | None => Err(ProtocolError::EmptyName),
            Some(name) => Ok(name.to_string()),
        },
        Some(NAME) => Err(ProtocolError::WrongArity {
            command: NAME,
            expected: 2,
            found: line.len(),
        }),
        Some(other) => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Server → Participant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Request identity
    Who,
    /// Requested name already in use
    NameTaken,
    /// Your turn
    YourTurn,
    /// You are being removed
    Kick,
    /// Chat relay
    Msg { from: String, content: String },
    /// Departure notice
    Left { name: String },
}

impl ServerMessage {
    /// Decode and validate one line from the server
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let line = codec::decode(raw);
        let spec = validate(&line, Direction::ToParticipant)?;
        let arg = |i| line.arg(i).unwrap_or_default().to_string();
        Ok(match spec.name {
            "WHO" => ServerMessage::Who,
            "NAME_TAKEN" => ServerMessage::NameTaken,
            "YT" => ServerMessage::YourTurn,
            "KICK" => ServerMessage::Kick,
            "MSG" => ServerMessage::Msg {
                from: arg(0),
                content: arg(1),
            },
            _ => ServerMessage::Left { name: arg(0) },
        })
    }

    /// Wire form without the newline
    pub fn to_line(&self) -> String {
        match self {
            ServerMessage::Who => codec::encode(&["WHO"]),
            ServerMessage::NameTaken => codec::encode(&["NAME_TAKEN"]),
            ServerMessage::YourTurn => codec::encode(&["YT"]),
            ServerMessage::Kick => codec::encode(&["KICK"]),
            ServerMessage::Msg { from, content } => codec::encode(&["MSG", from.as_str(), content.as_str()]),
            ServerMessage::Left { name } => codec::encode(&["LEFT", name.as_str()]),
        }
    }
}

/// Human-readable notice printed on the server's stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    Joined { name: String },
    Chat { name: String, content: String },
    Left { name: String },
}

impl std::fmt::Display for Announcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Announcement::Joined { name } => write!(f, "({} has entered the chat)", name),
            Announcement::Chat { name, content } => write!(f, "({}) {}", name, content),
            Announcement::Left { name } => write!(f, "({} has left the chat)", name),
        }
    }
}
