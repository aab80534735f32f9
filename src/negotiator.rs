//! Name negotiation
//!
//! Per-participant handshake: the server sends `WHO:` and expects
//! `NAME:<name>`. A free name is bound, a taken one earns `NAME_TAKEN:`
//! and another prompt, anything else rejects the participant.

use std::time::Duration;

use tracing::{debug, warn};

use crate::channel::Incoming;
use crate::error::ProtocolError;
use crate::message::{self, ServerMessage};
use crate::registry::Registry;
use crate::types::ParticipantId;

/// Result of one `WHO:` exchange
#[derive(Debug, PartialEq, Eq)]
pub enum NameOutcome {
    /// Name bound; negotiation for this participant is over
    Named(String),
    /// Name belongs to someone else; prompt again
    Taken(String),
    /// Bad reply; the participant has been deactivated
    Rejected,
    /// Participant was already named or inactive; nothing was sent
    Skipped,
}

/// Run one `WHO:` round with participant `id`
pub async fn negotiate_name(
    registry: &mut Registry,
    id: ParticipantId,
    reply_timeout: Option<Duration>,
) -> NameOutcome {
    let Some(participant) = registry.get_mut(id) else {
        return NameOutcome::Skipped;
    };
    if participant.has_name() || !participant.is_active() {
        return NameOutcome::Skipped;
    }

    // A failed write shows up as end-of-stream on the read below
    if let Err(e) = participant.send(&ServerMessage::Who).await {
        debug!("WHO: to {} failed: {}", id, e);
    }

    let name = match read_name(registry, id, reply_timeout).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Rejecting participant {} during negotiation: {}", id, e);
            if let Some(participant) = registry.get_mut(id) {
                participant.deactivate();
            }
            return NameOutcome::Rejected;
        }
    };

    if registry.is_name_taken(&name, id) {
        debug!("Name '{}' requested by {} is taken", name, id);
        if let Some(participant) = registry.get_mut(id) {
            if let Err(e) = participant.send(&ServerMessage::NameTaken).await {
                debug!("NAME_TAKEN: to {} failed: {}", id, e);
            }
        }
        return NameOutcome::Taken(name);
    }

    match registry.get_mut(id) {
        Some(participant) => {
            if participant.bind_name(name.clone()) {
                NameOutcome::Named(name)
            } else {
                NameOutcome::Skipped
            }
        }
        None => NameOutcome::Skipped,
    }
}

async fn read_name(
    registry: &mut Registry,
    id: ParticipantId,
    reply_timeout: Option<Duration>,
) -> Result<String, ProtocolError> {
    let participant = registry
        .get_mut(id)
        .ok_or(ProtocolError::EndOfStream)?;
    match participant.receive(reply_timeout).await? {
        Incoming::Line(line) => message::parse_name_reply(&line),
        Incoming::EndOfStream => Err(ProtocolError::EndOfStream),
    }
}
