//! # Gossip Network Subsystem (PL-04)
//!
//! Spreads ingested block events between peers on a fixed cadence.
//!
//! ## Architecture
//!
//! ```text
//!   IngestStore ──events_since──→ [broadcast] ──PeerTransport──→ peers
//!        ↑                                                        │
//!        └──────append──── [listen] ←── inbox ←── TcpAcceptor ←───┘
//! ```
//!
//! Gossip is advisory. Received events go through the same `append`
//! contract as API submissions and are validated by consensus like any
//! other event.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryHub, InMemoryTransport, TcpAcceptor, TcpTransport};
pub use domain::{
    BroadcastReport, CleanupReport, GossipConfig, GossipError, GossipMessage, GossipResult,
    GossipStats, ListenReport, LoopKind, PeerOrigin, PeerRecord, TransportError, ETA, LAMBDA,
};
pub use ports::PeerTransport;
pub use service::{GossipDependencies, GossipService};
