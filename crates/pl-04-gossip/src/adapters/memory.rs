//! # In-Memory Transport
//!
//! A hub of mailboxes, one per address. Lets several gossip services run in
//! one process for tests and local simulations.

use crate::domain::{GossipMessage, TransportError};
use crate::ports::PeerTransport;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Shared routing table for in-memory transports.
#[derive(Debug, Default)]
pub struct InMemoryHub {
    mailboxes: RwLock<HashMap<String, mpsc::Sender<GossipMessage>>>,
    partitioned: RwLock<HashSet<String>>,
}

impl InMemoryHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `address` and return its transport and inbox.
    pub fn join(
        self: &Arc<Self>,
        address: &str,
        capacity: usize,
    ) -> (InMemoryTransport, mpsc::Receiver<GossipMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.mailboxes.write().insert(address.to_string(), tx);
        let transport = InMemoryTransport {
            hub: Arc::clone(self),
            address: address.to_string(),
        };
        (transport, rx)
    }

    /// Drop the mailbox for `address`.
    pub fn leave(&self, address: &str) {
        self.mailboxes.write().remove(address);
    }

    /// Make `address` unreachable (or reachable again) without dropping it.
    pub fn set_partitioned(&self, address: &str, partitioned: bool) {
        let mut set = self.partitioned.write();
        if partitioned {
            set.insert(address.to_string());
        } else {
            set.remove(address);
        }
    }

    fn deliver(&self, peer: &str, message: GossipMessage) -> Result<(), TransportError> {
        if self.partitioned.read().contains(peer) {
            return Err(TransportError::Unreachable {
                peer: peer.to_string(),
                reason: "partitioned".to_string(),
            });
        }

        let sender = self
            .mailboxes
            .read()
            .get(peer)
            .cloned()
            .ok_or_else(|| TransportError::Unreachable {
                peer: peer.to_string(),
                reason: "no such address".to_string(),
            })?;

        sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure {
                peer: peer.to_string(),
            },
            TrySendError::Closed(_) => TransportError::Unreachable {
                peer: peer.to_string(),
                reason: "inbox closed".to_string(),
            },
        })
    }
}

/// Transport bound to one address on an [`InMemoryHub`].
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    hub: Arc<InMemoryHub>,
    address: String,
}

impl InMemoryTransport {
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl PeerTransport for InMemoryTransport {
    async fn send(&self, peer: &str, message: GossipMessage) -> Result<(), TransportError> {
        self.hub.deliver(peer, message)
    }

    fn describe(&self) -> String {
        format!("in-memory:{}", self.address)
    }
}
