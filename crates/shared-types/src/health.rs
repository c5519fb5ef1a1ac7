//! # Service Liveness
//!
//! Long-running loops publish a [`LoopHeartbeat`]; anything that wants to
//! report on them (the supervisor, the health endpoints) reads it through
//! the [`ServiceProbe`] trait without knowing the concrete service.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Coarse run state of a background service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Loop is running.
    Running,
    /// Loop is running but something it depends on is unhappy.
    Degraded,
    /// Loop is not running.
    Stopped,
}

impl ServiceStatus {
    pub fn is_alive(&self) -> bool {
        !matches!(self, ServiceStatus::Stopped)
    }
}

/// Liveness report for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub name: String,
    pub status: ServiceStatus,
    /// Unix seconds of the last completed iteration, if any.
    pub last_activity: Option<u64>,
    /// Free-form detail (e.g. engine state, peer count).
    pub detail: Option<String>,
}

/// Something whose liveness can be reported.
pub trait ServiceProbe: Send + Sync {
    fn name(&self) -> &str;

    fn health(&self) -> ServiceHealth;
}

/// Shared running flag plus last-tick timestamp for a loop.
#[derive(Debug, Default)]
pub struct LoopHeartbeat {
    running: AtomicBool,
    last_tick: AtomicU64,
    ticks: AtomicU64,
}

impl LoopHeartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_started(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Record a completed iteration at `now` (unix seconds).
    pub fn beat(&self, now: u64) {
        self.last_tick.store(now, Ordering::Relaxed);
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn last_tick(&self) -> Option<u64> {
        match self.last_tick.load(Ordering::Relaxed) {
            0 => None,
            t => Some(t),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> ServiceStatus {
        if self.is_running() {
            ServiceStatus::Running
        } else {
            ServiceStatus::Stopped
        }
    }
}
