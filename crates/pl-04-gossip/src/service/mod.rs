//! # Gossip Service
//!
//! Exchanges ingested events with peers on three independent timers.
//!
//! - **Broadcast**: for every known peer, send the events appended since
//!   that peer's cursor, then advance the cursor on success.
//! - **Listen**: drain the inbox and `append` every received event.
//!   Duplicates are counted, not errors.
//! - **Cleanup**: prune quiet learned peers and compact bookkeeping.
//!
//! Each round is also callable directly (`broadcast_once`, `listen_once`,
//! `cleanup_once`) so tests can drive the protocol without timers.

mod broadcast;
mod listen;
mod maintenance;
mod runner;


use crate::domain::{
    GossipConfig, GossipCounters, GossipMessage, GossipStats, LoopKind, PeerRecord, PeerTable,
};
use crate::ports::PeerTransport;
use parking_lot::{Mutex, RwLock};
use pl_02_ingest_store::IngestStore;
use shared_types::{LoopHeartbeat, ServiceHealth, ServiceProbe, ServiceStatus, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Everything a `GossipService` needs.
pub struct GossipDependencies {
    pub ingest: Arc<IngestStore>,
    pub transport: Arc<dyn PeerTransport>,
    /// Messages delivered to this node by whatever transport is in use.
    pub inbound: mpsc::Receiver<GossipMessage>,
    pub time_source: Arc<dyn TimeSource>,
    pub config: GossipConfig,
    /// Address peers use to reach this node. Sent with every message.
    pub local_address: String,
    pub bootstrap_peers: Vec<String>,
}

/// Which peer handed us an event, so it is not echoed straight back.
#[derive(Debug, Clone)]
struct Provenance {
    peer: String,
    received_at: u64,
}

#[derive(Debug, Default)]
struct LoopHeartbeats {
    broadcast: LoopHeartbeat,
    listen: LoopHeartbeat,
    cleanup: LoopHeartbeat,
}

/// Gossip network service.
pub struct GossipService {
    config: GossipConfig,
    local_address: String,
    ingest: Arc<IngestStore>,
    transport: Arc<dyn PeerTransport>,
    inbound: Mutex<mpsc::Receiver<GossipMessage>>,
    peers: RwLock<PeerTable>,
    provenance: Mutex<HashMap<String, Provenance>>,
    time_source: Arc<dyn TimeSource>,
    counters: GossipCounters,
    heartbeats: LoopHeartbeats,
}

impl GossipService {
    pub fn new(deps: GossipDependencies) -> Self {
        let now = deps.time_source.now();
        let mut peers = PeerTable::new();
        for address in &deps.bootstrap_peers {
            if *address != deps.local_address {
                peers.add_bootstrap(address, now);
            }
        }

        info!(
            local_address = %deps.local_address,
            transport = %deps.transport.describe(),
            bootstrap_peers = peers.len(),
            "[pl-04] Gossip service created"
        );

        Self {
            config: deps.config,
            local_address: deps.local_address,
            ingest: deps.ingest,
            transport: deps.transport,
            inbound: Mutex::new(deps.inbound),
            peers: RwLock::new(peers),
            provenance: Mutex::new(HashMap::new()),
            time_source: deps.time_source,
            counters: GossipCounters::default(),
            heartbeats: LoopHeartbeats::default(),
        }
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    /// Add a peer at runtime; it is treated like a configured peer.
    pub fn add_peer(&self, address: &str) {
        if address != self.local_address {
            self.peers.write().add_bootstrap(address, self.time_source.now());
        }
    }

    pub fn peers(&self) -> Vec<PeerRecord> {
        self.peers.read().records()
    }

    pub fn peer(&self, address: &str) -> Option<PeerRecord> {
        self.peers.read().get(address).cloned()
    }

    pub fn stats(&self) -> GossipStats {
        self.counters.snapshot(self.peers.read().len())
    }

    pub fn heartbeat(&self, kind: LoopKind) -> &LoopHeartbeat {
        match kind {
            LoopKind::Broadcast => &self.heartbeats.broadcast,
            LoopKind::Listen => &self.heartbeats.listen,
            LoopKind::Cleanup => &self.heartbeats.cleanup,
        }
    }
}

impl ServiceProbe for GossipService {
    fn name(&self) -> &str {
        "gossip"
    }

    /// Running when all three loops run, degraded when only some do.
    fn health(&self) -> ServiceHealth {
        let running = LoopKind::ALL
            .iter()
            .filter(|k| self.heartbeat(**k).is_running())
            .count();
        let status = match running {
            0 => ServiceStatus::Stopped,
            n if n == LoopKind::ALL.len() => ServiceStatus::Running,
            _ => ServiceStatus::Degraded,
        };

        ServiceHealth {
            name: self.name().to_string(),
            status,
            last_activity: LoopKind::ALL
                .iter()
                .filter_map(|k| self.heartbeat(*k).last_tick())
                .max(),
            detail: Some(format!(
                "loops={}/{} peers={}",
                running,
                LoopKind::ALL.len(),
                self.peers.read().len()
            )),
        }
    }
}
