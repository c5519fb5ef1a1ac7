//! Wire message exchanged between peers.

use serde::{Deserialize, Serialize};
use shared_types::BlockEvent;

/// One transmission. An empty `events` list is still sent each round so the
/// receiver keeps the sender's peer record fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipMessage {
    /// Gossip address of the sender, as peers should dial it back.
    pub sender: String,
    pub events: Vec<BlockEvent>,
}

impl GossipMessage {
    pub fn new(sender: impl Into<String>, events: Vec<BlockEvent>) -> Self {
        Self {
            sender: sender.into(),
            events,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.events.is_empty()
    }
}
