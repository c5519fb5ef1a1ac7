//! Gossip counters and per-round reports.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which periodic loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    Broadcast,
    Listen,
    Cleanup,
}

impl LoopKind {
    pub const ALL: [LoopKind; 3] = [LoopKind::Broadcast, LoopKind::Listen, LoopKind::Cleanup];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopKind::Broadcast => "broadcast",
            LoopKind::Listen => "listen",
            LoopKind::Cleanup => "cleanup",
        }
    }
}

/// Outcome of one broadcast round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub peers_attempted: usize,
    pub peers_succeeded: usize,
    pub events_sent: usize,
}

/// Outcome of one listen round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListenReport {
    pub messages: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub peers_learned: usize,
}

/// Outcome of one cleanup round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub peers_pruned: usize,
    pub cursors_clamped: usize,
    pub provenance_compacted: usize,
}

/// Snapshot of the gossip counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GossipStats {
    pub broadcast_rounds: u64,
    pub listen_rounds: u64,
    pub cleanup_rounds: u64,
    pub events_sent: u64,
    pub events_received: u64,
    pub duplicates: u64,
    pub send_failures: u64,
    pub peers_pruned: u64,
    pub peer_count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct GossipCounters {
    pub broadcast_rounds: AtomicU64,
    pub listen_rounds: AtomicU64,
    pub cleanup_rounds: AtomicU64,
    pub events_sent: AtomicU64,
    pub events_received: AtomicU64,
    pub duplicates: AtomicU64,
    pub send_failures: AtomicU64,
    pub peers_pruned: AtomicU64,
}

impl GossipCounters {
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn round(&self, kind: LoopKind) {
        let counter = match kind {
            LoopKind::Broadcast => &self.broadcast_rounds,
            LoopKind::Listen => &self.listen_rounds,
            LoopKind::Cleanup => &self.cleanup_rounds,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, peer_count: usize) -> GossipStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        GossipStats {
            broadcast_rounds: load(&self.broadcast_rounds),
            listen_rounds: load(&self.listen_rounds),
            cleanup_rounds: load(&self.cleanup_rounds),
            events_sent: load(&self.events_sent),
            events_received: load(&self.events_received),
            duplicates: load(&self.duplicates),
            send_failures: load(&self.send_failures),
            peers_pruned: load(&self.peers_pruned),
            peer_count,
        }
    }
}
