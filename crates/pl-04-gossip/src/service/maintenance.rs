use super::GossipService;
use crate::domain::{CleanupReport, GossipCounters, LoopKind};
use crate::metrics;
use tracing::info;

impl GossipService {
    /// Prune quiet learned peers and compact exchange bookkeeping.
    ///
    /// - learned peers unseen for `peer_stale_after_secs` are dropped
    /// - cursors past the end of the log are pulled back
    /// - provenance older than the staleness window, or naming a pruned
    ///   peer, is forgotten
    pub fn cleanup_once(&self) -> CleanupReport {
        let now = self.time_source.now();
        let cutoff = now.saturating_sub(self.config.peer_stale_after_secs);

        let (pruned, cursors_clamped, peer_count) = {
            let mut peers = self.peers.write();
            let pruned = peers.prune(cutoff);
            let clamped = peers.clamp_cursors(self.ingest.last_sequence());
            (pruned, clamped, peers.len())
        };

        let provenance_compacted = {
            let mut provenance = self.provenance.lock();
            let before = provenance.len();
            provenance.retain(|_, origin| {
                origin.received_at >= cutoff && !pruned.contains(&origin.peer)
            });
            before - provenance.len()
        };

        for peer in &pruned {
            info!(%peer, "[pl-04] Pruned stale peer");
        }

        GossipCounters::add(&self.counters.peers_pruned, pruned.len());
        self.counters.round(LoopKind::Cleanup);
        self.heartbeats.cleanup.beat(now);
        metrics::record_round(LoopKind::Cleanup.as_str());
        metrics::record_peer_count(peer_count);

        CleanupReport {
            peers_pruned: pruned.len(),
            cursors_clamped,
            provenance_compacted,
        }
    }
}
