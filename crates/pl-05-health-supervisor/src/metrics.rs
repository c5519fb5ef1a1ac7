//! Supervisor metrics, compiled in with the `metrics` feature.

#[cfg(feature = "metrics")]
use ledger_telemetry::metrics::{DESYNC_DETECTED, ENGINE_RESTARTS, SUPERVISOR_FATAL};

#[cfg(feature = "metrics")]
pub fn record_restart(trigger: &str) {
    ENGINE_RESTARTS.with_label_values(&[trigger]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_desync(desynced: bool) {
    DESYNC_DETECTED.set(i64::from(desynced));
}

#[cfg(feature = "metrics")]
pub fn record_fatal(fatal: bool) {
    SUPERVISOR_FATAL.set(i64::from(fatal));
}

#[cfg(not(feature = "metrics"))]
pub fn record_restart(_trigger: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_desync(_desynced: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fatal(_fatal: bool) {}
