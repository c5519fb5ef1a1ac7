//! In-memory chain repository for tests and ephemeral nodes.

use crate::domain::{ConsensusResult, PersistedChain};
use crate::ports::ChainStateRepository;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryChainRepository {
    chain: RwLock<Option<PersistedChain>>,
    saves: AtomicU64,
}

impl InMemoryChainRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Overwrite the stored chain directly.
    pub fn replace(&self, chain: Option<PersistedChain>) {
        *self.chain.write() = chain;
    }
}

impl ChainStateRepository for InMemoryChainRepository {
    fn load(&self) -> ConsensusResult<Option<PersistedChain>> {
        Ok(self.chain.read().clone())
    }

    fn save(&self, chain: &PersistedChain) -> ConsensusResult<()> {
        *self.chain.write() = Some(chain.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn location(&self) -> String {
        "in-memory".to_string()
    }
}
