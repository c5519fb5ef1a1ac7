//! Supervisor errors.

use pl_03_consensus::ConsensusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Too many restarts inside the window. Automatic recovery stops.
    #[error("restart budget exceeded: {budget} restarts within {window_secs}s")]
    RestartBudgetExceeded { budget: usize, window_secs: u64 },

    #[error("consensus engine: {0}")]
    Consensus(#[from] ConsensusError),
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
