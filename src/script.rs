//! Scripted chat client
//!
//! Replays a pre-loaded chat script one turn at a time. Lines that are not
//! well-formed client commands are skipped.

use crate::codec::{self, DecodedLine};
use crate::handler::{Behavior, TurnPlan};

/// Usage message for the client binary
pub const USAGE: &str = "Usage: chat_client chatscript";

/// Base name used during negotiation
pub const BASE_NAME: &str = "client";

/// Commands a script may emit, with their field counts
const SCRIPT_COMMANDS: &[(&str, usize)] = &[
    ("NAME", 2),
    ("CHAT", 2),
    ("DONE", 1),
    ("KICK", 2),
    ("QUIT", 1),
];

/// Chat script with a cursor into it
#[derive(Debug, Clone)]
pub struct ChatScript {
    lines: Vec<String>,
    cursor: usize,
}

impl ChatScript {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, cursor: 0 }
    }

    /// Index of the next line to replay
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

fn is_emittable(line: &DecodedLine) -> bool {
    if line.malformed || line.arg(0) == Some("") {
        return false;
    }
    SCRIPT_COMMANDS
        .iter()
        .any(|(name, arity)| line.name() == Some(*name) && line.len() == *arity)
}

impl Behavior for ChatScript {
    /// Emit script lines up to the next `DONE:`
    ///
    /// Reaching the last line or emitting `QUIT:` ends the script.
    fn on_turn(&mut self) -> TurnPlan {
        let mut plan = TurnPlan::default();
        loop {
            let Some(raw) = self.lines.get(self.cursor) else {
                plan.leave = true;
                return plan;
            };
            let line = codec::decode(raw);
            let valid = is_emittable(&line);
            if valid {
                plan.lines.push(raw.clone());
            }

            let is_last = self.cursor + 1 >= self.lines.len();
            if is_last || (valid && line.name() == Some("QUIT")) {
                plan.leave = true;
                return plan;
            }

            self.cursor += 1;
            if valid && line.name() == Some("DONE") {
                return plan;
            }
        }
    }
}
