//! Outbound ports: where the chain is persisted.

use crate::domain::{ConsensusResult, PersistedChain};

/// Persists the whole chain so a restart never has to replay the ingest log.
///
/// Production: `FileChainRepository`. Testing: `InMemoryChainRepository`.
pub trait ChainStateRepository: Send + Sync {
    /// Latest saved chain, or `None` on first start.
    fn load(&self) -> ConsensusResult<Option<PersistedChain>>;

    /// Replace the saved chain. Must be atomic.
    fn save(&self, chain: &PersistedChain) -> ConsensusResult<()>;

    /// Human-readable location, logged on bootstrap.
    fn location(&self) -> String;
}
