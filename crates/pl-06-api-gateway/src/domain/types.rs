//! Request and response bodies.

use pl_02_ingest_store::{EventStatus, StoredEvent};
use pl_03_consensus::{ChainState, StatusReport};
use pl_05_health_supervisor::HealthSnapshot;
use serde::{Deserialize, Serialize};
use shared_types::{BlockEvent, Capacity, ServiceHealth};

// =============================================================================
// INGEST
// =============================================================================

/// `POST /events` body. Same fields as `BlockEvent`, with the timestamp
/// sent as `ts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitEventRequest {
    pub event_id: String,
    pub block_index: u64,
    pub block_hash: String,
    pub content_id: String,
    pub miner_address: String,
    pub capacity: Capacity,
    pub work_score: f64,
    pub ts: i64,
    pub signature: String,
    pub public_key: String,
}

impl From<SubmitEventRequest> for BlockEvent {
    fn from(req: SubmitEventRequest) -> Self {
        BlockEvent {
            event_id: req.event_id,
            block_index: req.block_index,
            block_hash: req.block_hash,
            content_id: req.content_id,
            miner_address: req.miner_address,
            capacity: req.capacity,
            work_score: req.work_score,
            timestamp: req.ts,
            signature: req.signature,
            public_key: req.public_key,
        }
    }
}

impl From<BlockEvent> for SubmitEventRequest {
    fn from(event: BlockEvent) -> Self {
        SubmitEventRequest {
            event_id: event.event_id,
            block_index: event.block_index,
            block_hash: event.block_hash,
            content_id: event.content_id,
            miner_address: event.miner_address,
            capacity: event.capacity,
            work_score: event.work_score,
            ts: event.timestamp,
            signature: event.signature,
            public_key: event.public_key,
        }
    }
}

/// `202 Accepted` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitEventResponse {
    pub event_id: String,
    pub status: String,
    /// Ingest sequence assigned to the event.
    pub sequence: u64,
}

/// `GET /events/{event_id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatusResponse {
    pub event_id: String,
    /// `pending`, `accepted` or `rejected`.
    pub status: String,
    /// Height the event asked for.
    pub block_index: u64,
    pub sequence: u64,
    pub ingested_at: u64,
    /// Height of the block it produced, once accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_block: Option<u64>,
    /// Rejection code, e.g. `superseded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<StoredEvent> for EventStatusResponse {
    fn from(stored: StoredEvent) -> Self {
        let (accepted_block, reason_code, reason) = match &stored.status {
            EventStatus::Pending => (None, None, None),
            EventStatus::Accepted { block_index } => (Some(*block_index), None, None),
            EventStatus::Rejected { reason } => {
                (None, Some(reason.code().to_string()), Some(reason.to_string()))
            }
        };
        EventStatusResponse {
            status: stored.status.label().to_string(),
            event_id: stored.event.event_id,
            block_index: stored.event.block_index,
            sequence: stored.sequence,
            ingested_at: stored.ingested_at,
            accepted_block,
            reason_code,
            reason,
        }
    }
}

// =============================================================================
// HEALTH
// =============================================================================

/// `GET /health/status` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Engine loop is up and accepting work.
    pub active: bool,
    pub chain_head_index: u64,
    pub desynced: bool,
}

/// `GET /health/consensus` body.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusHealth {
    pub engine: StatusReport,
    pub supervisor: HealthSnapshot,
}

/// `GET /health/blockchain` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockchainSummary {
    pub length: usize,
    pub head_index: u64,
    pub head_hash: String,
    pub cumulative_work_score: f64,
}

impl From<&ChainState> for BlockchainSummary {
    fn from(chain: &ChainState) -> Self {
        let head = chain.head();
        BlockchainSummary {
            length: chain.len(),
            head_index: head.index,
            head_hash: head.block_hash.clone(),
            cumulative_work_score: chain.cumulative_work_score(),
        }
    }
}

/// `GET /health/services` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesResponse {
    pub services: Vec<ServiceHealth>,
}

/// `POST /health/consensus/restart` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartResponse {
    pub restarted: bool,
    pub head_index: u64,
    pub reconciled: usize,
}
