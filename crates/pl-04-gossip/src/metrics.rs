//! Gossip metrics, compiled in with the `metrics` feature.

#[cfg(feature = "metrics")]
use ledger_telemetry::metrics::{
    EVENTS_INGESTED, GOSSIP_EVENTS, GOSSIP_PEERS, GOSSIP_ROUNDS, GOSSIP_SEND_FAILURES,
};

#[cfg(feature = "metrics")]
pub fn record_round(kind: &str) {
    GOSSIP_ROUNDS.with_label_values(&[kind]).inc();
}

/// `direction` is `sent` or `received`.
#[cfg(feature = "metrics")]
pub fn record_events(direction: &str, count: usize) {
    GOSSIP_EVENTS
        .with_label_values(&[direction])
        .inc_by(count as u64);
}

/// Events appended to the local log from peers.
#[cfg(feature = "metrics")]
pub fn record_ingested(count: usize) {
    EVENTS_INGESTED
        .with_label_values(&["gossip"])
        .inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_send_failure() {
    GOSSIP_SEND_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_peer_count(count: usize) {
    GOSSIP_PEERS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

#[cfg(not(feature = "metrics"))]
pub fn record_round(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_events(_direction: &str, _count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_ingested(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_send_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_peer_count(_count: usize) {}
