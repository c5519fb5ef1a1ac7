//! Health snapshot produced by every poll.

use pl_03_consensus::EngineStatus;
use serde::{Deserialize, Serialize};

/// What caused a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartTrigger {
    Desync,
    Manual,
}

impl RestartTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartTrigger::Desync => "desync",
            RestartTrigger::Manual => "manual",
        }
    }
}

/// Point-in-time health. Recomputed on each poll; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub checked_at: u64,
    pub chain_head_index: u64,
    pub ingest_store_max_index: Option<u64>,
    pub desync_detected: bool,
    pub last_restart_at: Option<u64>,
    /// Restarts inside the current budget window.
    pub restart_count: usize,
    pub consecutive_desync_polls: u32,
    /// Restart budget exhausted; automatic recovery has stopped.
    pub fatal: bool,
    pub engine_status: EngineStatus,
}
