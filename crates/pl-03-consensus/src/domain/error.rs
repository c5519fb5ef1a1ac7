//! Error types for the consensus engine.

use pl_02_ingest_store::IngestError;

/// Consensus error types
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Invalid block height: expected {expected}, got {actual}")]
    InvalidHeight { expected: u64, actual: u64 },

    #[error("Block {index} does not link to its parent: expected {expected}, got {actual}")]
    ParentMismatch {
        index: u64,
        expected: String,
        actual: String,
    },

    #[error("Block {index} hash does not match its contents")]
    HashMismatch { index: u64 },

    #[error("Block {index} cumulative work score is inconsistent")]
    CumulativeWorkMismatch { index: u64 },

    #[error("Persisted chain is corrupt: {0}")]
    CorruptChain(String),

    #[error("Chain persistence failed: {0}")]
    Persistence(String),

    #[error("Ingest store error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Engine not ready: {0}")]
    NotReady(&'static str),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
