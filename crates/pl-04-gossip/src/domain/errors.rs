//! Gossip error types.

use pl_02_ingest_store::IngestError;
use thiserror::Error;

/// Failure to deliver one message to one peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("send to {peer} timed out after {timeout_ms}ms")]
    Timeout { peer: String, timeout_ms: u64 },

    #[error("peer {peer} inbox is full")]
    Backpressure { peer: String },

    #[error("message encoding failed: {0}")]
    Encode(String),

    #[error("frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },
}

/// Errors surfaced by the gossip service.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("ingest log: {0}")]
    Ingest(#[from] IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GossipResult<T> = Result<T, GossipError>;
