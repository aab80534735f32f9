//! Turn-based Chat Hub Library
//!
//! A chat server that spawns one child process per configured participant
//! and talks to each over a pair of pipes using a colon-delimited line
//! protocol.
//!
//! # Features
//! - Participant process spawning from a config file
//! - Unique name negotiation (`WHO:` / `NAME:` / `NAME_TAKEN:`)
//! - Round-robin turns (`YT:`) until every participant has left
//! - Chat relay, kick requests and departure notices
//! - Scripted client and pattern-response bot participants
//!
//! # Architecture
//! A single `ChatServer` owns the `Registry` of participants and drives
//! them strictly one at a time:
//! - `negotiator` binds names in registry order
//! - `ChatServer::run_cycle` gives every active participant one turn
//! - effects (broadcast, kick, quit) are applied as replies arrive
//!
//! Participants run `handler::run_participant` with a `Behavior`
//! (`script::ChatScript` or `bot::ResponderBot`).
//!
//! # Example
//! ```ignore
//! use tokio::sync::mpsc;
//! use chat_hub::{load_participants, ChatServer, Registry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let specs = load_participants("chat.conf".as_ref()).await.unwrap();
//!     let registry = Registry::spawn_all(&specs).unwrap();
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     tokio::spawn(async move {
//!         while let Some(notice) = rx.recv().await {
//!             println!("{}", notice);
//!         }
//!     });
//!
//!     let mut server = ChatServer::new(registry, tx);
//!     server.run().await;
//!     server.shutdown().await;
//! }
//! ```

pub mod bot;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod message;
pub mod negotiator;
pub mod participant;
pub mod registry;
pub mod script;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use channel::{Channel, Incoming};
pub use codec::{decode, DecodedLine};
pub use config::{load_participants, ParticipantSpec, ServerConfig};
pub use error::{AppError, ChannelError, ProtocolError};
pub use handler::{run_participant, Behavior, TurnPlan};
pub use message::{Announcement, ClientMessage, Direction, ServerMessage};
pub use participant::Participant;
pub use registry::Registry;
pub use server::{ChatServer, TurnStep};
pub use types::{ParticipantExit, ParticipantId};
