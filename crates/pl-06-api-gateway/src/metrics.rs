//! Ingest counters recorded by the gateway.

use ledger_telemetry::metrics::{EVENTS_INGESTED, SUBMISSIONS_REFUSED};

pub fn record_accepted() {
    EVENTS_INGESTED.with_label_values(&["api"]).inc();
}

pub fn record_refused(reason: &str) {
    SUBMISSIONS_REFUSED.with_label_values(&[reason]).inc();
}
