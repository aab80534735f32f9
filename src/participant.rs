//! Participant record
//!
//! Server-side state of one connected participant process: its stable id,
//! negotiated name, active flag and exclusively owned channel.

use std::time::Duration;

use crate::channel::{Channel, Incoming};
use crate::error::ChannelError;
use crate::message::ServerMessage;
use crate::types::ParticipantId;

/// Connected participant information
#[derive(Debug)]
pub struct Participant {
    /// Registry position of this participant
    pub id: ParticipantId,
    /// Negotiated name (None until negotiation binds it)
    name: Option<String>,
    /// Cleared once on quit, kick, protocol error or end-of-stream
    active: bool,
    /// Duplex pipe to the participant process
    channel: Channel,
}

impl Participant {
    /// Create a new, active, unnamed participant
    pub fn new(id: ParticipantId, channel: Channel) -> Self {
        Self {
            id,
            name: None,
            active: true,
            channel,
        }
    }

    /// Send a message to this participant
    ///
    /// Inactive participants are never written to.
    pub async fn send(&mut self, msg: &ServerMessage) -> Result<(), ChannelError> {
        if !self.active {
            return Err(ChannelError::Inactive);
        }
        self.channel.send_line(&msg.to_line()).await
    }

    /// Read the participant's next line
    pub async fn receive(&mut self, limit: Option<Duration>) -> Result<Incoming, ChannelError> {
        if !self.active {
            return Err(ChannelError::Inactive);
        }
        self.channel.receive_line_within(limit).await
    }

    /// Get the display name for this participant
    ///
    /// Falls back to the registry position before negotiation.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("participant {}", self.id),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Bind the negotiated name
    ///
    /// A name is set at most once; returns false if one was already bound.
    pub fn bind_name(&mut self, name: String) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark the participant inactive
    ///
    /// Returns true only on the first call.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    /// Give up the channel for teardown
    pub fn into_channel(self) -> Channel {
        self.channel
    }
}
