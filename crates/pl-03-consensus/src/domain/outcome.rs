//! Results of engine operations.

use serde::Serialize;
use shared_types::RejectReason;

/// What one `process_next` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing pending.
    Idle,
    /// A block was appended. `event_id` is the fork winner, which may differ
    /// from the event that triggered processing.
    Accepted {
        event_id: String,
        block_index: u64,
        superseded: Vec<String>,
    },
    /// The oldest pending event was refused.
    Rejected {
        event_id: String,
        reason: RejectReason,
    },
}

impl ProcessOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, ProcessOutcome::Idle)
    }
}

/// Summary of a completed bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub head_index: u64,
    pub chain_length: usize,
    /// Where the chain was loaded from.
    pub location: String,
    /// `false` when genesis was created fresh.
    pub loaded_from_disk: bool,
    /// Pending log entries marked accepted because their block already
    /// existed.
    pub reconciled: usize,
}
