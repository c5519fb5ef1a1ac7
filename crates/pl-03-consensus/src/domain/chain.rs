//! Chain state management
//!
//! `ChainState` is the single-writer aggregate: the ordered blocks from
//! genesis to head. The engine owns the only mutable copy; everyone else reads
//! an `Arc` snapshot.

use super::block::{genesis_block, rehash};
use super::error::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use shared_types::Block;
use std::collections::HashMap;

/// Bumped when the persisted layout changes.
pub const PERSISTED_FORMAT_VERSION: u32 = 1;

/// Tolerance for recomputed cumulative work.
const WORK_EPSILON: f64 = 1e-6;

/// Current chain head information
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainHead {
    pub index: u64,
    pub block_hash: String,
    pub cumulative_work_score: f64,
    pub timestamp: i64,
}

impl From<&Block> for ChainHead {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            block_hash: block.block_hash.clone(),
            cumulative_work_score: block.cumulative_work_score,
            timestamp: block.timestamp,
        }
    }
}

/// On-disk form: ordered blocks plus the head pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedChain {
    pub format_version: u32,
    pub head: ChainHead,
    pub blocks: Vec<Block>,
}

/// Ordered blocks, genesis first.
#[derive(Clone, Debug)]
pub struct ChainState {
    blocks: Vec<Block>,
    /// event_id -> block index
    by_event: HashMap<String, u64>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainState {
    /// A chain holding only genesis.
    pub fn new() -> Self {
        Self {
            blocks: vec![genesis_block()],
            by_event: HashMap::new(),
        }
    }

    /// Rebuild from persisted form, verifying every link.
    pub fn from_persisted(persisted: PersistedChain) -> ConsensusResult<Self> {
        if persisted.format_version != PERSISTED_FORMAT_VERSION {
            return Err(ConsensusError::CorruptChain(format!(
                "unsupported format version {}",
                persisted.format_version
            )));
        }

        let mut blocks = persisted.blocks.into_iter();
        let genesis = blocks
            .next()
            .ok_or_else(|| ConsensusError::CorruptChain("no genesis block".to_string()))?;
        if genesis != genesis_block() {
            return Err(ConsensusError::CorruptChain(
                "genesis block does not match".to_string(),
            ));
        }

        let mut state = Self::new();
        for block in blocks {
            state.append(block)?;
        }

        if ChainHead::from(state.head()) != persisted.head {
            return Err(ConsensusError::CorruptChain(format!(
                "head pointer {} does not match last block {}",
                persisted.head.index,
                state.head_index()
            )));
        }

        Ok(state)
    }

    pub fn to_persisted(&self) -> PersistedChain {
        PersistedChain {
            format_version: PERSISTED_FORMAT_VERSION,
            head: ChainHead::from(self.head()),
            blocks: self.blocks.clone(),
        }
    }

    /// Append a block after checking height, parent link, hash and
    /// cumulative work.
    pub fn append(&mut self, block: Block) -> ConsensusResult<()> {
        let parent = self.head();

        if block.index != parent.index + 1 {
            return Err(ConsensusError::InvalidHeight {
                expected: parent.index + 1,
                actual: block.index,
            });
        }
        if block.parent_hash != parent.block_hash {
            return Err(ConsensusError::ParentMismatch {
                index: block.index,
                expected: parent.block_hash.clone(),
                actual: block.parent_hash.clone(),
            });
        }
        if rehash(&block) != block.block_hash {
            return Err(ConsensusError::HashMismatch { index: block.index });
        }
        let expected_work = parent.cumulative_work_score + block.work_score;
        if (block.cumulative_work_score - expected_work).abs() > WORK_EPSILON {
            return Err(ConsensusError::CumulativeWorkMismatch { index: block.index });
        }

        self.by_event.insert(block.event_id.clone(), block.index);
        self.blocks.push(block);
        Ok(())
    }

    pub fn head(&self) -> &Block {
        // Never empty: constructed with genesis and truncation keeps it.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn head_index(&self) -> u64 {
        self.head().index
    }

    pub fn chain_head(&self) -> ChainHead {
        ChainHead::from(self.head())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: u64) -> Option<&Block> {
        self.blocks.get(usize::try_from(index).ok()?)
    }

    pub fn block_for_event(&self, event_id: &str) -> Option<&Block> {
        self.by_event.get(event_id).and_then(|i| self.block(*i))
    }

    pub fn cumulative_work_score(&self) -> f64 {
        self.head().cumulative_work_score
    }

    /// Last `limit` blocks, newest first.
    pub fn recent_blocks(&self, limit: usize) -> Vec<Block> {
        self.blocks.iter().rev().take(limit).cloned().collect()
    }
}
