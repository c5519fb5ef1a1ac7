//! Block construction and hashing.
//!
//! ## Hash layout
//!
//! ```text
//! SHA-256( "proof-ledger/block/v1"
//!          || index (u64 LE) || parent_hash || event_id || miner_address
//!          || work_score bits (u64 LE) || timestamp (i64 LE) )
//! ```
//!
//! Strings are `u32 LE length || bytes`. Every input is stored on the block,
//! so a persisted chain can be re-verified without the ingest log.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::Block;
use std::time::Duration;

/// Parent hash carried by genesis.
pub const GENESIS_PARENT_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

const BLOCK_HASH_TAG: &[u8] = b"proof-ledger/block/v1";

/// Engine tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Gas charged for any block
    pub base_gas: u64,
    /// Extra gas per unit of work score, rounded up
    pub gas_per_work_unit: f64,
    /// Floor of the gas price curve
    pub base_gas_price: f64,
    /// Work score at which the price curve has covered ~26% of its rise
    pub work_scale: f64,
    /// Undamped block reward
    pub base_reward: f64,
    /// How long a pending event may sit at a filled height, or a height gap
    /// may persist, before the engine counts as desynced (seconds)
    pub staleness_window_secs: u64,
    /// Largest tolerated `max_known_index - head.index`
    pub max_index_gap: u64,
    /// Sleep between empty polls of the ingest log
    #[serde(with = "duration_millis")]
    pub idle_poll_interval: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            base_gas: 21_000,
            gas_per_work_unit: 1_000.0,
            base_gas_price: 1.0,
            work_scale: 10.0,
            base_reward: 50.0,
            staleness_window_secs: 120,
            max_index_gap: 16,
            idle_poll_interval: Duration::from_millis(250),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

fn put_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u32).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Deterministic block hash, lowercase hex.
pub fn compute_block_hash(
    index: u64,
    parent_hash: &str,
    event_id: &str,
    miner_address: &str,
    work_score: f64,
    timestamp: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(BLOCK_HASH_TAG);
    hasher.update(index.to_le_bytes());
    put_str(&mut hasher, parent_hash);
    put_str(&mut hasher, event_id);
    put_str(&mut hasher, miner_address);
    hasher.update(work_score.to_bits().to_le_bytes());
    hasher.update(timestamp.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the hash of an existing block from its own fields.
pub fn rehash(block: &Block) -> String {
    compute_block_hash(
        block.index,
        &block.parent_hash,
        &block.event_id,
        &block.miner_address,
        block.work_score,
        block.timestamp,
    )
}

/// The block every node starts from.
pub fn genesis_block() -> Block {
    let block_hash = compute_block_hash(0, GENESIS_PARENT_HASH, "", "", 0.0, 0);
    Block {
        index: 0,
        block_hash,
        parent_hash: GENESIS_PARENT_HASH.to_string(),
        event_id: String::new(),
        work_score: 0.0,
        cumulative_work_score: 0.0,
        gas_used: 0,
        gas_price: 0.0,
        reward: 0.0,
        miner_address: String::new(),
        timestamp: 0,
    }
}
