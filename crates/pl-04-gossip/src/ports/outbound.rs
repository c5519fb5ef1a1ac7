//! Outbound ports (SPI) for the gossip subsystem.

use crate::domain::{GossipMessage, TransportError};
use async_trait::async_trait;

/// Delivers a message to one peer.
///
/// Delivery is one-way: inbound messages arrive through the channel handed
/// to `GossipService` at construction, whatever the transport.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send `message` to `peer`. Callers bound this with their own timeout.
    async fn send(&self, peer: &str, message: GossipMessage) -> Result<(), TransportError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}
