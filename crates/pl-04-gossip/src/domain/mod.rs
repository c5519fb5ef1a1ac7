//! Gossip domain: configuration, peer bookkeeping, wire message, counters.

pub mod config;
pub mod errors;
pub mod message;
pub mod peer;
pub mod stats;

pub use config::{GossipConfig, ETA, LAMBDA};
pub use errors::{GossipError, GossipResult, TransportError};
pub use message::GossipMessage;
pub use peer::{PeerOrigin, PeerRecord, PeerTable};
pub use stats::{BroadcastReport, CleanupReport, GossipStats, ListenReport, LoopKind};
pub(crate) use stats::GossipCounters;
