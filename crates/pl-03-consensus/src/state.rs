//! Engine lifecycle and counters.
//!
//! ```text
//! Bootstrapping ──► Running ◄──────────────┐
//!                     │                     │
//!                     ▼                     │
//!                 Desynced ──► Recovering ──┘
//! ```

use crate::domain::{DesyncReport, GapTracker};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Bootstrapping,
    Running,
    Desynced,
    Recovering,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Bootstrapping => "bootstrapping",
            EngineStatus::Running => "running",
            EngineStatus::Desynced => "desynced",
            EngineStatus::Recovering => "recovering",
        }
    }

    /// Events are only processed once a chain is loaded.
    pub fn accepts_work(&self) -> bool {
        matches!(self, EngineStatus::Running | EngineStatus::Desynced)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable engine bookkeeping, separate from the chain itself.
pub struct EngineState {
    status: RwLock<EngineStatus>,
    pub(crate) processed: AtomicU64,
    pub(crate) accepted: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) superseded: AtomicU64,
    pub(crate) bootstraps: AtomicU64,
    /// 0 = never
    pub(crate) bootstrapped_at: AtomicU64,
    last_error: RwLock<Option<String>>,
    pub(crate) gap_tracker: Mutex<GapTracker>,
    last_desync: RwLock<Option<DesyncReport>>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(EngineStatus::Bootstrapping),
            processed: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
            bootstraps: AtomicU64::new(0),
            bootstrapped_at: AtomicU64::new(0),
            last_error: RwLock::new(None),
            gap_tracker: Mutex::new(GapTracker::default()),
            last_desync: RwLock::new(None),
        }
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.read()
    }

    pub fn set_status(&self, status: EngineStatus) -> EngineStatus {
        std::mem::replace(&mut *self.status.write(), status)
    }

    /// Swap `from` for `to` only if the current status is `from`.
    pub fn transition(&self, from: EngineStatus, to: EngineStatus) -> bool {
        let mut status = self.status.write();
        if *status == from {
            *status = to;
            true
        } else {
            false
        }
    }

    pub fn record_error(&self, error: String) {
        *self.last_error.write() = Some(error);
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn record_desync(&self, report: DesyncReport) {
        *self.last_desync.write() = Some(report);
    }

    pub fn last_desync(&self) -> Option<DesyncReport> {
        self.last_desync.read().clone()
    }

    pub(crate) fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

/// Engine snapshot served by `GET /health/consensus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: EngineStatus,
    pub head_index: u64,
    pub head_hash: String,
    pub chain_length: usize,
    pub cumulative_work_score: f64,
    pub processed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub superseded: u64,
    pub bootstraps: u64,
    pub bootstrapped_at: Option<u64>,
    pub pending_events: usize,
    pub last_error: Option<String>,
    pub last_desync: Option<DesyncReport>,
}
