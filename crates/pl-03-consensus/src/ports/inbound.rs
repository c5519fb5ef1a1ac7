//! Inbound ports: the engine as seen by the supervisor and the API.

use crate::domain::{BootstrapReport, ChainState, ConsensusResult, DesyncReport, ProcessOutcome};
use crate::state::{EngineStatus, StatusReport};
use std::sync::Arc;

/// Consensus engine API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait ConsensusApi: Send + Sync {
    /// Load (or create) the chain and reconcile it with the ingest log.
    fn bootstrap(&self) -> ConsensusResult<BootstrapReport>;

    /// Process the oldest pending event, if any.
    fn process_next(&self) -> ConsensusResult<ProcessOutcome>;

    /// Point-in-time view of the chain.
    fn snapshot(&self) -> Arc<ChainState>;

    fn status(&self) -> EngineStatus;

    fn status_report(&self) -> StatusReport;

    /// Compare the chain with the ingest log at `now` (unix seconds).
    fn check_desync(&self, now: u64) -> ConsensusResult<DesyncReport>;

    /// Mark the engine as recovering ahead of a restart.
    fn begin_recovery(&self);
}
