//! Membership registry
//!
//! Ordered arena of participant records addressed by `ParticipantId`.
//! Insertion order is configuration order and drives both turn order and
//! broadcast order.

use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::config::ParticipantSpec;
use crate::error::ChannelError;
use crate::participant::Participant;
use crate::types::ParticipantId;

/// All participants known to the server
#[derive(Debug, Default)]
pub struct Registry {
    participants: Vec<Participant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one participant process per config entry, in order
    ///
    /// Stops at the first spawn failure; children already started are
    /// killed when the partial registry is dropped.
    pub fn spawn_all(specs: &[ParticipantSpec]) -> Result<Self, ChannelError> {
        let mut registry = Self::new();
        for spec in specs {
            let channel = Channel::spawn(&spec.program, &spec.argument)?;
            let id = registry.add(channel);
            info!("Participant {} started: {}", id, spec);
        }
        Ok(registry)
    }

    /// Register a new participant, returning its id
    pub fn add(&mut self, channel: Channel) -> ParticipantId {
        let id = ParticipantId(self.participants.len());
        self.participants.push(Participant::new(id, channel));
        id
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(id.index())
    }

    /// Number of participants ever registered
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// All ids in registry order
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participants.iter().map(|p| p.id)
    }

    /// Ids of active participants in registry order
    pub fn active_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active()).count()
    }

    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.get(id).is_some_and(Participant::is_active)
    }

    /// Active participant holding `name`
    pub fn find_active_by_name(&self, name: &str) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.is_active() && p.name() == Some(name))
            .map(|p| p.id)
    }

    /// Whether a participant other than `asking` already holds `name`
    pub fn is_name_taken(&self, name: &str, asking: ParticipantId) -> bool {
        self.participants
            .iter()
            .any(|p| p.id != asking && p.name() == Some(name))
    }

    /// Close every channel and reap the children concurrently
    pub async fn shutdown(self, grace: Duration) {
        let count = self.participants.len();
        let closing = self
            .participants
            .into_iter()
            .map(|p| p.into_channel().close(grace));
        let statuses = join_all(closing).await;
        debug!(
            "Closed {} channels ({} exit statuses collected)",
            count,
            statuses.iter().flatten().count()
        );
    }
}
