//! Error types for the chat hub
//!
//! Defines program-level errors, channel (pipe/process) errors and
//! protocol errors. Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors
///
/// The only errors that terminate the server process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad command line invocation
    #[error("{0}")]
    Usage(String),

    /// Config, script or response file could not be read
    #[error("failed to read '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid environment variable value
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Channel error that cannot be absorbed (spawn failure)
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Errors on a participant's duplex pipe
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The participant program could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A spawned child came back without one of its pipes
    #[error("child process is missing its {0} pipe")]
    MissingPipe(&'static str),

    /// Writing to the peer failed (usually the peer has exited)
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Reading from the peer failed
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Attempted to address a deactivated participant
    #[error("participant is inactive")]
    Inactive,

    /// No reply arrived within the configured timeout
    #[error("timed out waiting for a reply")]
    TimedOut,
}

/// Protocol violations by a participant
///
/// Never fatal to the server: the offending participant is deactivated.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Empty line
    #[error("empty command")]
    Empty,

    /// A single word without the trailing separator
    #[error("malformed command: {0:?}")]
    Malformed(String),

    /// Command name not in the expected vocabulary
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Known command with the wrong number of fields
    #[error("{command} expects {expected} fields, got {found}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    /// `NAME:` reply carrying an empty name
    #[error("empty name")]
    EmptyName,

    /// `CHAT:` reply carrying an empty message
    #[error("empty chat message")]
    EmptyMessage,

    /// The peer closed its end of the pipe
    #[error("end of stream")]
    EndOfStream,

    /// Underlying channel failure
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
