//! # Desync Detection
//!
//! The engine is desynced from the ingest log when either:
//!
//! - a pending event sits at a height the chain has already filled, and has
//!   been there longer than the staleness window, or
//! - `max_known_index - head.index` exceeds `max_index_gap` continuously for
//!   the staleness window.
//!
//! The first means the engine stopped consuming; the second means the log
//! moved ahead of it.

use serde::Serialize;

/// Why the engine counts as desynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesyncCause {
    StalePending { count: usize, lowest_index: u64 },
    IndexGap { gap: u64, since: u64 },
}

/// Result of one desync check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesyncReport {
    pub checked_at: u64,
    pub head_index: u64,
    pub max_known_index: Option<u64>,
    pub gap: u64,
    pub stale_pending: usize,
    pub desynced: bool,
    pub cause: Option<DesyncCause>,
}

/// Remembers when the index gap first exceeded the limit.
#[derive(Debug, Default, Clone, Copy)]
pub struct GapTracker {
    since: Option<u64>,
}

impl GapTracker {
    /// Record an observation; returns when the current excess began.
    pub fn observe(&mut self, exceeded: bool, now: u64) -> Option<u64> {
        if exceeded {
            Some(*self.since.get_or_insert(now))
        } else {
            self.since = None;
            None
        }
    }

    pub fn reset(&mut self) {
        self.since = None;
    }

    pub fn since(&self) -> Option<u64> {
        self.since
    }
}

/// Inputs gathered from the chain and the log.
#[derive(Debug, Clone, Copy)]
pub struct DesyncInputs {
    pub now: u64,
    pub head_index: u64,
    pub max_known_index: Option<u64>,
    pub stale_pending: usize,
    pub lowest_stale_index: Option<u64>,
    pub max_index_gap: u64,
    pub staleness_window_secs: u64,
}

pub fn evaluate(inputs: DesyncInputs, tracker: &mut GapTracker) -> DesyncReport {
    let gap = inputs
        .max_known_index
        .map(|max| max.saturating_sub(inputs.head_index))
        .unwrap_or(0);

    let since = tracker.observe(gap > inputs.max_index_gap, inputs.now);

    let cause = if inputs.stale_pending > 0 {
        Some(DesyncCause::StalePending {
            count: inputs.stale_pending,
            lowest_index: inputs.lowest_stale_index.unwrap_or(inputs.head_index),
        })
    } else {
        since
            .filter(|since| inputs.now.saturating_sub(*since) >= inputs.staleness_window_secs)
            .map(|since| DesyncCause::IndexGap { gap, since })
    };

    DesyncReport {
        checked_at: inputs.now,
        head_index: inputs.head_index,
        max_known_index: inputs.max_known_index,
        gap,
        stale_pending: inputs.stale_pending,
        desynced: cause.is_some(),
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(now: u64, head: u64, max_known: Option<u64>, stale: usize) -> DesyncInputs {
        DesyncInputs {
            now,
            head_index: head,
            max_known_index: max_known,
            stale_pending: stale,
            lowest_stale_index: if stale > 0 { Some(head) } else { None },
            max_index_gap: 5,
            staleness_window_secs: 60,
        }
    }

    #[test]
    fn test_in_sync() {
        let mut tracker = GapTracker::default();
        let report = evaluate(inputs(100, 3, Some(4), 0), &mut tracker);
        assert!(!report.desynced);
        assert_eq!(report.gap, 1);
    }

    #[test]
    fn test_stale_pending_is_immediate() {
        let mut tracker = GapTracker::default();
        let report = evaluate(inputs(100, 3, Some(3), 2), &mut tracker);
        assert!(report.desynced);
        assert!(matches!(
            report.cause,
            Some(DesyncCause::StalePending { count: 2, .. })
        ));
    }

    #[test]
    fn test_gap_must_persist_for_window() {
        let mut tracker = GapTracker::default();
        assert!(!evaluate(inputs(100, 0, Some(10), 0), &mut tracker).desynced);
        assert!(!evaluate(inputs(159, 0, Some(10), 0), &mut tracker).desynced);
        let report = evaluate(inputs(160, 0, Some(10), 0), &mut tracker);
        assert!(report.desynced);
        assert_eq!(
            report.cause,
            Some(DesyncCause::IndexGap { gap: 10, since: 100 })
        );
    }

    #[test]
    fn test_gap_closing_resets_timer() {
        let mut tracker = GapTracker::default();
        evaluate(inputs(100, 0, Some(10), 0), &mut tracker);
        evaluate(inputs(130, 8, Some(10), 0), &mut tracker);
        assert_eq!(tracker.since(), None);
        assert!(!evaluate(inputs(170, 0, Some(10), 0), &mut tracker).desynced);
    }

    #[test]
    fn test_empty_log_has_no_gap() {
        let mut tracker = GapTracker::default();
        let report = evaluate(inputs(0, 0, None, 0), &mut tracker);
        assert_eq!(report.gap, 0);
        assert!(!report.desynced);
    }
}
