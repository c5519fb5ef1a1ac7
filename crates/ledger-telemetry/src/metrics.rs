//! Prometheus metrics for Proof-Ledger subsystems.
//!
//! All metrics follow the naming convention: `pl_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_accepted_total)
//! - **Gauge**: Value that can go up or down (e.g., chain_height)
//! - **Histogram**: Distribution of values (e.g., event_processing_seconds)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INGEST METRICS (PL-02 / API)
    // =========================================================================

    /// Events appended to the ingest log, labeled by source (api/gossip)
    pub static ref EVENTS_INGESTED: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_ingest_events_total", "Events appended to the ingest log"),
        &["source"]
    ).expect("metric creation failed");

    /// Submissions refused at the API boundary, labeled by reason
    pub static ref SUBMISSIONS_REFUSED: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_api_submissions_refused_total", "Submissions refused before ingest"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // CONSENSUS METRICS (PL-03)
    // =========================================================================

    /// Blocks appended to the chain
    pub static ref BLOCKS_ACCEPTED: IntCounter = IntCounter::new(
        "pl_consensus_blocks_accepted_total",
        "Total number of blocks appended to the chain"
    ).expect("metric creation failed");

    /// Events rejected by the engine, labeled by reason code
    pub static ref EVENTS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_consensus_events_rejected_total", "Events rejected by the engine"),
        &["reason"]
    ).expect("metric creation failed");

    /// Current chain head index
    pub static ref CHAIN_HEIGHT: IntGauge = IntGauge::new(
        "pl_consensus_chain_height",
        "Index of the current chain head"
    ).expect("metric creation failed");

    /// Cumulative work score at the head
    pub static ref CUMULATIVE_WORK: Gauge = Gauge::new(
        "pl_consensus_cumulative_work_score",
        "Cumulative work score at the chain head"
    ).expect("metric creation failed");

    /// Time to validate, price and store one event
    pub static ref EVENT_PROCESSING_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pl_consensus_event_processing_seconds",
            "Time spent processing one event"
        ).buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    ).expect("metric creation failed");

    // =========================================================================
    // GOSSIP METRICS (PL-04)
    // =========================================================================

    /// Completed gossip rounds, labeled by loop (broadcast/listen/cleanup)
    pub static ref GOSSIP_ROUNDS: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_gossip_rounds_total", "Completed gossip rounds"),
        &["loop"]
    ).expect("metric creation failed");

    /// Events moved by gossip, labeled by direction (sent/received/duplicate)
    pub static ref GOSSIP_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_gossip_events_total", "Events exchanged with peers"),
        &["direction"]
    ).expect("metric creation failed");

    /// Failed sends to peers
    pub static ref GOSSIP_SEND_FAILURES: IntCounter = IntCounter::new(
        "pl_gossip_send_failures_total",
        "Sends to a peer that failed or timed out"
    ).expect("metric creation failed");

    /// Known peers
    pub static ref GOSSIP_PEERS: IntGauge = IntGauge::new(
        "pl_gossip_peers",
        "Peers currently in the peer table"
    ).expect("metric creation failed");

    // =========================================================================
    // SUPERVISOR METRICS (PL-05)
    // =========================================================================

    /// Engine restarts, labeled by trigger (desync/manual)
    pub static ref ENGINE_RESTARTS: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_supervisor_engine_restarts_total", "Consensus engine restarts"),
        &["trigger"]
    ).expect("metric creation failed");

    /// 1 while the last poll reported desync
    pub static ref DESYNC_DETECTED: IntGauge = IntGauge::new(
        "pl_supervisor_desync_detected",
        "Whether the last health poll detected desync"
    ).expect("metric creation failed");

    /// 1 once the restart budget is exhausted
    pub static ref SUPERVISOR_FATAL: IntGauge = IntGauge::new(
        "pl_supervisor_fatal",
        "Whether automatic recovery has been stopped"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ingest
        Box::new(EVENTS_INGESTED.clone()),
        Box::new(SUBMISSIONS_REFUSED.clone()),
        // Consensus
        Box::new(BLOCKS_ACCEPTED.clone()),
        Box::new(EVENTS_REJECTED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(CUMULATIVE_WORK.clone()),
        Box::new(EVENT_PROCESSING_DURATION.clone()),
        // Gossip
        Box::new(GOSSIP_ROUNDS.clone()),
        Box::new(GOSSIP_EVENTS.clone()),
        Box::new(GOSSIP_SEND_FAILURES.clone()),
        Box::new(GOSSIP_PEERS.clone()),
        // Supervisor
        Box::new(ENGINE_RESTARTS.clone()),
        Box::new(DESYNC_DETECTED.clone()),
        Box::new(SUPERVISOR_FATAL.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
