//! # Consensus Metrics
//!
//! Thin wrappers over the shared Prometheus registry.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! pl-03-consensus = { path = "...", features = ["metrics"] }
//! ```

#[cfg(feature = "metrics")]
use ledger_telemetry::metrics::{
    BLOCKS_ACCEPTED, CHAIN_HEIGHT, CUMULATIVE_WORK, EVENTS_REJECTED, EVENT_PROCESSING_DURATION,
};

/// Record an appended block and the new head.
#[cfg(feature = "metrics")]
pub fn record_block_accepted(head_index: u64, cumulative_work_score: f64) {
    BLOCKS_ACCEPTED.inc();
    record_head(head_index, cumulative_work_score);
}

/// Publish the head without counting a block (bootstrap).
#[cfg(feature = "metrics")]
pub fn record_head(head_index: u64, cumulative_work_score: f64) {
    CHAIN_HEIGHT.set(i64::try_from(head_index).unwrap_or(i64::MAX));
    CUMULATIVE_WORK.set(cumulative_work_score);
}

/// Record a rejected event with its reason code
#[cfg(feature = "metrics")]
pub fn record_event_rejected(reason: &str) {
    EVENTS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record processing latency
#[cfg(feature = "metrics")]
pub fn record_processing_latency(seconds: f64) {
    EVENT_PROCESSING_DURATION.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_accepted(_head_index: u64, _cumulative_work_score: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_head(_head_index: u64, _cumulative_work_score: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_processing_latency(_seconds: f64) {}
