//! Consensus domain: block construction, pricing, chain state, fork choice
//! and desync evaluation. No I/O.

pub mod block;
pub mod chain;
pub mod desync;
pub mod error;
pub mod fork_choice;
pub mod outcome;
pub mod rewards;

pub use block::{compute_block_hash, genesis_block, rehash, ConsensusConfig, GENESIS_PARENT_HASH};
pub use chain::{ChainHead, ChainState, PersistedChain, PERSISTED_FORMAT_VERSION};
pub use desync::{evaluate as evaluate_desync, DesyncCause, DesyncInputs, DesyncReport, GapTracker};
pub use error::{ConsensusError, ConsensusResult};
pub use fork_choice::{compare_candidates, select_winner};
pub use outcome::{BootstrapReport, ProcessOutcome};
pub use rewards::{calculate, gas_price, gas_used, reward, BlockEconomics, DAMPING_FACTOR};
