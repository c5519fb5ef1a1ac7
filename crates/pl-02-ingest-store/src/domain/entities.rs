//! # Ingest Records
//!
//! What the log stores for each event, and the status it moves through.

use serde::{Deserialize, Serialize};
use shared_types::{BlockEvent, EventOutcome, RejectReason};

/// Processing status of a logged event.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Pending,
    Accepted { block_index: u64 },
    Rejected { reason: RejectReason },
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventStatus::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Accepted { .. } => "accepted",
            EventStatus::Rejected { .. } => "rejected",
        }
    }
}

impl From<EventOutcome> for EventStatus {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::Accepted { block_index } => EventStatus::Accepted { block_index },
            EventOutcome::Rejected { reason } => EventStatus::Rejected { reason },
        }
    }
}

/// One record in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// The event exactly as submitted.
    pub event: BlockEvent,
    pub status: EventStatus,
    /// Log offset assigned at append, starting at 1.
    pub sequence: u64,
    /// Local unix seconds at append.
    pub ingested_at: u64,
}

impl StoredEvent {
    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }

    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Highest sequence handed out so far; 0 when the log is empty.
    pub last_sequence: u64,
}
