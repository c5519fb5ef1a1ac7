use super::{GossipService, Provenance};
use crate::domain::{GossipCounters, ListenReport, LoopKind};
use crate::metrics;
use pl_02_ingest_store::IngestError;
use tracing::{debug, info, warn};

impl GossipService {
    /// Drain the inbox and append every received event to the log.
    ///
    /// At most `inbound_capacity` messages are taken per round so a flood
    /// cannot pin the loop.
    pub fn listen_once(&self) -> ListenReport {
        let now = self.time_source.now();
        let mut report = ListenReport::default();

        let mut inbox = self.inbound.lock();
        while report.messages < self.config.inbound_capacity {
            let Ok(message) = inbox.try_recv() else {
                break;
            };
            report.messages += 1;

            if message.sender == self.local_address {
                continue;
            }
            if self.peers.write().observe(&message.sender, now) {
                report.peers_learned += 1;
                info!(peer = %message.sender, "[pl-04] 🤝 Learned new peer");
            }

            for event in message.events {
                let event_id = event.event_id.clone();
                match self.ingest.append(event) {
                    Ok(_) => {
                        report.appended += 1;
                        self.provenance.lock().insert(
                            event_id,
                            Provenance {
                                peer: message.sender.clone(),
                                received_at: now,
                            },
                        );
                    }
                    Err(IngestError::DuplicateEvent { .. }) => report.duplicates += 1,
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            peer = %message.sender,
                            %event_id,
                            "[pl-04] failed to append gossiped event: {}",
                            e
                        );
                    }
                }
            }
        }
        drop(inbox);

        GossipCounters::add(&self.counters.events_received, report.appended);
        GossipCounters::add(&self.counters.duplicates, report.duplicates);
        self.counters.round(LoopKind::Listen);
        self.heartbeats.listen.beat(now);
        metrics::record_round(LoopKind::Listen.as_str());
        metrics::record_events("received", report.appended);
        metrics::record_ingested(report.appended);

        if report.messages > 0 {
            debug!(
                messages = report.messages,
                appended = report.appended,
                duplicates = report.duplicates,
                "[pl-04] listen round"
            );
        }
        report
    }
}
