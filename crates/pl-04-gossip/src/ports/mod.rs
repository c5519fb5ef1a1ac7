//! Ports for the gossip subsystem.

pub mod outbound;

pub use outbound::PeerTransport;
