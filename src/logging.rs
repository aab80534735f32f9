//! Tracing setup shared by the binaries
//!
//! Logs go to stderr: the server's stdout is reserved for chat
//! announcements and a participant's stdout is its protocol pipe.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "chat_hub=warn";

/// Initialize the global subscriber
///
/// Use the RUST_LOG env var to control the level,
/// e.g. RUST_LOG=debug or RUST_LOG=chat_hub=trace
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}
