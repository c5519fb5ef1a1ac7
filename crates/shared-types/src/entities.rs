//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Submission**: `BlockEvent`, `Capacity`
//! - **Chain**: `Block`
//! - **Processing outcome**: `EventOutcome`, `RejectReason`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FormatError;

/// Length of a hex-encoded Ed25519 public key (32 bytes).
pub const PUBLIC_KEY_HEX_LEN: usize = 64;

/// Length of a hex-encoded Ed25519 signature (64 bytes).
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Upper bound on free-form string fields of a submission.
pub const MAX_FIELD_LEN: usize = 256;

// =============================================================================
// CLUSTER A: SUBMISSION
// =============================================================================

/// Class of device that performed the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capacity {
    Mobile,
    Laptop,
    Desktop,
    Server,
}

impl Capacity {
    /// Lowercase wire name; also the form that enters the signing encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capacity::Mobile => "mobile",
            Capacity::Laptop => "laptop",
            Capacity::Desktop => "desktop",
            Capacity::Server => "server",
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted, possibly-invalid claim of completed work.
///
/// Events are immutable once persisted. The ingest log only ever records a
/// terminal outcome next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEvent {
    /// Globally unique identifier chosen by the submitter.
    pub event_id: String,
    /// Candidate height this event wants to close.
    pub block_index: u64,
    /// Submitter-computed hash of the work result.
    pub block_hash: String,
    /// Content-addressed pointer to the off-chain payload.
    pub content_id: String,
    /// Address credited with the reward.
    pub miner_address: String,
    /// Device class of the submitter.
    pub capacity: Capacity,
    /// Declared work contribution, non-negative.
    pub work_score: f64,
    /// Unix seconds.
    pub timestamp: i64,
    /// Ed25519 signature, 128 hex chars.
    pub signature: String,
    /// Ed25519 public key, 64 hex chars.
    pub public_key: String,
}

impl BlockEvent {
    /// Structural checks that do not involve cryptography.
    ///
    /// Hex length/charset of `signature` and `public_key` is the signature
    /// verifier's job; this only rejects values no verifier could accept.
    pub fn validate_format(&self) -> Result<(), FormatError> {
        check_text("event_id", &self.event_id)?;
        check_text("block_hash", &self.block_hash)?;
        check_text("content_id", &self.content_id)?;
        check_text("miner_address", &self.miner_address)?;

        if self.block_index < 1 {
            return Err(FormatError::InvalidField {
                field: "block_index",
                reason: "must be >= 1".to_string(),
            });
        }
        if !self.work_score.is_finite() || self.work_score < 0.0 {
            return Err(FormatError::InvalidField {
                field: "work_score",
                reason: format!("must be a finite value >= 0, got {}", self.work_score),
            });
        }
        if self.timestamp < 0 {
            return Err(FormatError::InvalidField {
                field: "timestamp",
                reason: "must be >= 0".to_string(),
            });
        }
        Ok(())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<(), FormatError> {
    if value.is_empty() {
        return Err(FormatError::MissingField(field));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(FormatError::InvalidField {
            field,
            reason: format!("longer than {} bytes", MAX_FIELD_LEN),
        });
    }
    Ok(())
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// A finalized position in the chain.
///
/// Produced exactly once by the consensus engine from one accepted
/// `BlockEvent` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Height; `chain[i].index == i`.
    pub index: u64,
    /// Deterministic hash of (index, parent_hash, event, timestamp).
    pub block_hash: String,
    /// Hash of the previous block.
    pub parent_hash: String,
    /// Event this block was produced from. Empty for genesis.
    pub event_id: String,
    /// Work contributed by this block alone.
    pub work_score: f64,
    /// Sum of work scores from genesis to this block.
    pub cumulative_work_score: f64,
    pub gas_used: u64,
    pub gas_price: f64,
    pub reward: f64,
    pub miner_address: String,
    /// Unix seconds, taken from the accepted event.
    pub timestamp: i64,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

// =============================================================================
// CLUSTER C: PROCESSING OUTCOME
// =============================================================================

/// Why the consensus engine refused an event.
///
/// Externally tagged: ingest records are bincode-encoded, which cannot
/// decode internally tagged enums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Malformed field, hex, or length.
    InvalidFormat { detail: String },
    /// Well-formed but the Ed25519 check failed.
    InvalidSignature,
    /// Height was not `head + 1`.
    OutOfOrderIndex { expected: u64, actual: u64 },
    /// Lost a fork at its height to a heavier sibling.
    Superseded { winner: String },
}

impl RejectReason {
    /// Short machine-readable label, also used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidFormat { .. } => "invalid_format",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::OutOfOrderIndex { .. } => "out_of_order_index",
            RejectReason::Superseded { .. } => "superseded",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidFormat { detail } => write!(f, "invalid_format: {}", detail),
            RejectReason::InvalidSignature => f.write_str("invalid_signature"),
            RejectReason::OutOfOrderIndex { expected, actual } => {
                write!(f, "out_of_order_index: expected {}, got {}", expected, actual)
            }
            RejectReason::Superseded { winner } => write!(f, "superseded by {}", winner),
        }
    }
}

/// Terminal outcome recorded against an event in the ingest log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Accepted { block_index: u64 },
    Rejected { reason: RejectReason },
}
