//! Server configuration
//!
//! Command line, environment overrides and the participant config file.
//! The config file holds one `<programPath>:<argument>` entry per line;
//! comments and malformed lines are skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::codec;
use crate::error::AppError;

/// Usage message for the server binary
pub const USAGE: &str = "Usage: chat_server configfile";

/// Per-read reply timeout in milliseconds (unset = wait forever)
pub const REPLY_TIMEOUT_ENV: &str = "CHAT_HUB_REPLY_TIMEOUT_MS";

/// Teardown grace period in milliseconds
pub const SHUTDOWN_GRACE_ENV: &str = "CHAT_HUB_SHUTDOWN_GRACE_MS";

/// Default teardown grace period
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// One participant to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSpec {
    /// Path of the participant program
    pub program: String,
    /// Single argument passed to the program (script or response file)
    pub argument: String,
}

impl std::fmt::Display for ParticipantSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.program, self.argument)
    }
}

/// Runtime settings of the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Path of the participant config file
    pub config_path: PathBuf,
    /// How long to wait for each reply line (None = no timeout)
    pub reply_timeout: Option<Duration>,
    /// How long teardown waits for each child before killing it
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    /// Build from `std::env::args()` and the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_parts(std::env::args(), |name| std::env::var(name).ok())
    }

    /// Build from an argument list (program name first) and an env lookup
    pub fn from_parts<I, F>(args: I, env: F) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut args = args.into_iter().skip(1);
        let (Some(config_path), None) = (args.next(), args.next()) else {
            return Err(AppError::Usage(USAGE.to_string()));
        };

        let reply_timeout = env_millis(&env, REPLY_TIMEOUT_ENV)?;
        let shutdown_grace = env_millis(&env, SHUTDOWN_GRACE_ENV)?.unwrap_or(DEFAULT_SHUTDOWN_GRACE);

        Ok(Self {
            config_path: PathBuf::from(config_path),
            reply_timeout,
            shutdown_grace,
        })
    }
}

fn env_millis<F>(env: &F, name: &str) -> Result<Option<Duration>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|e| AppError::InvalidEnvVar {
            name: name.to_string(),
            message: format!("expected milliseconds, got {:?} ({})", raw, e),
        })
}

/// Parse config file contents into participant entries
pub fn parse_participants(contents: &str) -> Vec<ParticipantSpec> {
    contents
        .lines()
        .filter(|line| !codec::is_comment(line))
        .filter_map(|line| {
            let decoded = codec::decode(line);
            match decoded.fields.as_slice() {
                [program, argument] => Some(ParticipantSpec {
                    program: program.clone(),
                    argument: argument.clone(),
                }),
                _ => {
                    debug!("Skipping config line {:?}", line);
                    None
                }
            }
        })
        .collect()
}

/// Read and parse the participant config file
pub async fn load_participants(path: &Path) -> Result<Vec<ParticipantSpec>, AppError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_participants(&contents))
}

/// Read a participant's script or response file as lines
pub async fn load_lines(path: &Path) -> Result<Vec<String>, AppError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(contents.lines().map(str::to_string).collect())
}
