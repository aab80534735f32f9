//! Basic type definitions for the chat hub
//!
//! Provides small wrappers for type safety:
//! - `ParticipantId`: stable registry position of a participant
//! - `ParticipantExit`: exit status of a participant process

/// Participant identifier (newtype pattern)
///
/// Wraps the participant's position in the registry. Positions are
/// assigned in configuration order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub usize);

impl ParticipantId {
    /// Registry position of this participant
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a participant process terminates
///
/// Each variant maps to a fixed process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantExit {
    /// Script finished or participant quit
    Normal,
    /// Bad invocation or unreadable script/response file
    Usage,
    /// Malformed line from the server or end of input
    CommsError,
    /// Removed by the server with `KICK:`
    Kicked,
}

impl ParticipantExit {
    /// Process exit code for this outcome
    pub fn code(self) -> i32 {
        match self {
            ParticipantExit::Normal => 0,
            ParticipantExit::Usage => 1,
            ParticipantExit::CommsError => 2,
            ParticipantExit::Kicked => 3,
        }
    }

    /// Message written to stderr on exit, if any
    pub fn message(self) -> Option<&'static str> {
        match self {
            ParticipantExit::Normal | ParticipantExit::Usage => None,
            ParticipantExit::CommsError => Some("Communications error"),
            ParticipantExit::Kicked => Some("Kicked"),
        }
    }
}
