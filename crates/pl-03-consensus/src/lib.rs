//! # Consensus Engine Subsystem (PL-03)
//!
//! Consumes pending events from the ingest log and folds them into the
//! append-only chain.
//!
//! ## Pipeline (per event)
//!
//! 1. **Validate**: format, Ed25519 signature (re-verified here even though
//!    the gateway already checked it), `block_index == head + 1`.
//! 2. **Fork choice**: all valid pending events at that height compete; the
//!    heaviest wins and the rest are `superseded`.
//! 3. **Calculate**: gas used, gas price, damped reward, cumulative work.
//! 4. **Store**: append the block, persist the chain, publish the new
//!    snapshot, then mark the log.
//!
//! Per-event failures are recorded against the event and never stop the
//! loop.
//!
//! ## Ownership
//!
//! The engine is the only writer of `ChainState`. Readers get an
//! `Arc<ChainState>` snapshot that never changes under them.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

pub use adapters::{FileChainRepository, InMemoryChainRepository};
pub use domain::{
    BootstrapReport, ChainHead, ChainState, ConsensusConfig, ConsensusError, ConsensusResult,
    DesyncCause, DesyncReport, PersistedChain, ProcessOutcome, DAMPING_FACTOR,
};
pub use ports::{ChainStateRepository, ConsensusApi};
pub use service::{ConsensusDependencies, ConsensusEngine};
pub use state::{EngineStatus, StatusReport};
