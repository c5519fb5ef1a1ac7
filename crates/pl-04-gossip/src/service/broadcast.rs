use super::GossipService;
use crate::domain::{BroadcastReport, GossipCounters, GossipMessage, LoopKind, TransportError};
use crate::metrics;
use futures::future::join_all;
use pl_02_ingest_store::EventStatus;
use shared_types::{BlockEvent, RejectReason};
use tracing::{debug, warn};

/// Rejected for format or signature, which every node would repeat.
/// Height and fork-choice rejections depend on the local chain.
fn is_malformed(status: &EventStatus) -> bool {
    matches!(
        status,
        EventStatus::Rejected {
            reason: RejectReason::InvalidFormat { .. } | RejectReason::InvalidSignature
        }
    )
}

enum PeerSend {
    Delivered { events: usize },
    Failed,
    Skipped,
}

impl GossipService {
    /// One broadcast round. Peers are contacted concurrently, each bounded
    /// by `send_timeout`, so one slow peer only costs its own attempt.
    pub async fn broadcast_once(&self) -> BroadcastReport {
        let targets = self.peers.read().targets();
        let mut report = BroadcastReport {
            peers_attempted: targets.len(),
            ..BroadcastReport::default()
        };

        let sends = targets
            .into_iter()
            .map(|(peer, cursor)| self.send_to_peer(peer, cursor));
        for result in join_all(sends).await {
            match result {
                PeerSend::Delivered { events } => {
                    report.peers_succeeded += 1;
                    report.events_sent += events;
                }
                PeerSend::Failed => {
                    GossipCounters::add(&self.counters.send_failures, 1);
                    metrics::record_send_failure();
                }
                PeerSend::Skipped => {}
            }
        }

        GossipCounters::add(&self.counters.events_sent, report.events_sent);
        self.counters.round(LoopKind::Broadcast);
        self.heartbeats.broadcast.beat(self.time_source.now());
        metrics::record_round(LoopKind::Broadcast.as_str());
        metrics::record_events("sent", report.events_sent);

        if report.peers_attempted > 0 {
            debug!(
                attempted = report.peers_attempted,
                succeeded = report.peers_succeeded,
                events = report.events_sent,
                "[pl-04] broadcast round"
            );
        }
        report
    }

    async fn send_to_peer(&self, peer: String, cursor: u64) -> PeerSend {
        let batch = match self
            .ingest
            .events_since(cursor, self.config.max_events_per_message)
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!(%peer, "[pl-04] cannot read ingest log for broadcast: {}", e);
                return PeerSend::Skipped;
            }
        };
        let next_cursor = batch.last().map(|r| r.sequence).unwrap_or(cursor);

        // Events no peer could accept stay in the log but are not relayed.
        let events: Vec<BlockEvent> = {
            let provenance = self.provenance.lock();
            batch
                .into_iter()
                .filter(|r| !is_malformed(&r.status))
                .filter(|r| {
                    provenance
                        .get(r.event_id())
                        .map_or(true, |origin| origin.peer != peer)
                })
                .map(|r| r.event)
                .collect()
        };
        let count = events.len();
        let message = GossipMessage::new(self.local_address.clone(), events);

        let result =
            match tokio::time::timeout(self.config.send_timeout, self.transport.send(&peer, message))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    peer: peer.clone(),
                    timeout_ms: self.config.send_timeout.as_millis() as u64,
                }),
            };

        match result {
            Ok(()) => {
                self.peers
                    .write()
                    .record_success(&peer, next_cursor, self.time_source.now());
                PeerSend::Delivered { events: count }
            }
            Err(e) => {
                self.peers.write().record_failure(&peer);
                debug!(%peer, "[pl-04] delivery failed, retrying next round: {}", e);
                PeerSend::Failed
            }
        }
    }
}
