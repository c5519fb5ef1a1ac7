//! # Event Index
//!
//! In-memory secondary indices over the log. Never persisted; rebuilt from
//! the backend when the store opens.
//!
//! | Index               | Serves                                   |
//! |---------------------|------------------------------------------|
//! | `by_order`          | `recent`                                 |
//! | `pending`           | `unprocessed`                            |
//! | `by_sequence`       | `events_since` (gossip)                  |
//! | `pending_by_height` | fork candidates, stale-pending scan      |
//! | `live_heights`      | `max_known_index`                        |

use super::entities::EventStatus;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

/// Sort key for recency: `(timestamp, block_index, sequence)`.
///
/// `sequence` is unique, so keys never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub timestamp: i64,
    pub block_index: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Pending,
    Accepted,
    Rejected,
}

impl From<&EventStatus> for StatusKind {
    fn from(status: &EventStatus) -> Self {
        match status {
            EventStatus::Pending => StatusKind::Pending,
            EventStatus::Accepted { .. } => StatusKind::Accepted,
            EventStatus::Rejected { .. } => StatusKind::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: OrderKey,
    ingested_at: u64,
    kind: StatusKind,
}

/// Secondary indices keyed by event id.
#[derive(Debug, Default)]
pub struct EventIndex {
    by_id: HashMap<String, Entry>,
    by_order: BTreeMap<OrderKey, String>,
    by_sequence: BTreeMap<u64, String>,
    pending: BTreeSet<OrderKey>,
    pending_by_height: BTreeMap<u64, BTreeSet<OrderKey>>,
    live_heights: BTreeMap<u64, usize>,
    accepted: usize,
    rejected: usize,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.by_id.contains_key(event_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn last_sequence(&self) -> u64 {
        self.by_sequence.keys().next_back().copied().unwrap_or(0)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    /// Register an event. Returns `false` if the id is already indexed.
    pub fn insert(
        &mut self,
        event_id: &str,
        key: OrderKey,
        ingested_at: u64,
        status: &EventStatus,
    ) -> bool {
        if self.by_id.contains_key(event_id) {
            return false;
        }

        let kind = StatusKind::from(status);
        self.by_order.insert(key, event_id.to_string());
        self.by_sequence.insert(key.sequence, event_id.to_string());

        match kind {
            StatusKind::Pending => {
                self.pending.insert(key);
                self.pending_by_height
                    .entry(key.block_index)
                    .or_default()
                    .insert(key);
            }
            StatusKind::Accepted => self.accepted += 1,
            StatusKind::Rejected => self.rejected += 1,
        }
        if kind != StatusKind::Rejected {
            *self.live_heights.entry(key.block_index).or_insert(0) += 1;
        }

        self.by_id.insert(
            event_id.to_string(),
            Entry {
                key,
                ingested_at,
                kind,
            },
        );
        true
    }

    /// Move a pending event to a terminal status.
    ///
    /// Returns `false` when the id is unknown or already terminal.
    pub fn finalize(&mut self, event_id: &str, status: &EventStatus) -> bool {
        let kind = StatusKind::from(status);
        let Some(entry) = self.by_id.get_mut(event_id) else {
            return false;
        };
        if entry.kind != StatusKind::Pending || kind == StatusKind::Pending {
            return false;
        }

        entry.kind = kind;
        let key = entry.key;

        self.pending.remove(&key);
        if let Some(set) = self.pending_by_height.get_mut(&key.block_index) {
            set.remove(&key);
            if set.is_empty() {
                self.pending_by_height.remove(&key.block_index);
            }
        }

        match kind {
            StatusKind::Accepted => self.accepted += 1,
            StatusKind::Rejected => {
                self.rejected += 1;
                if let Some(count) = self.live_heights.get_mut(&key.block_index) {
                    *count -= 1;
                    if *count == 0 {
                        self.live_heights.remove(&key.block_index);
                    }
                }
            }
            StatusKind::Pending => {}
        }
        true
    }

    /// Pending events strictly after `cursor`, oldest first.
    pub fn pending_after(
        &self,
        cursor: Option<OrderKey>,
        max_sequence: u64,
        limit: usize,
    ) -> Vec<(OrderKey, String)> {
        let lower = match cursor {
            Some(c) => Bound::Excluded(c),
            None => Bound::Unbounded,
        };

        self.pending
            .range((lower, Bound::Unbounded))
            .filter(|k| k.sequence <= max_sequence)
            .take(limit)
            .filter_map(|k| self.by_order.get(k).map(|id| (*k, id.clone())))
            .collect()
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<String> {
        self.by_order.values().rev().take(limit).cloned().collect()
    }

    /// Log order, sequences strictly greater than `after`.
    pub fn since(&self, after: u64, limit: usize) -> Vec<String> {
        self.by_sequence
            .range(after.saturating_add(1)..)
            .take(limit)
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn pending_at_height(&self, block_index: u64) -> Vec<String> {
        self.pending_by_height
            .get(&block_index)
            .map(|set| {
                set.iter()
                    .filter_map(|k| self.by_order.get(k).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pending events at heights `<= at_or_below` ingested before `cutoff`.
    pub fn stale_pending(&self, at_or_below: u64, cutoff: u64) -> Vec<String> {
        self.pending_by_height
            .range(..=at_or_below)
            .flat_map(|(_, set)| set.iter())
            .filter_map(|k| self.by_order.get(k))
            .filter(|id| {
                self.by_id
                    .get(id.as_str())
                    .is_some_and(|e| e.ingested_at < cutoff)
            })
            .cloned()
            .collect()
    }

    /// Highest `block_index` among events that are not rejected.
    pub fn max_known_index(&self) -> Option<u64> {
        self.live_heights.keys().next_back().copied()
    }

    /// Lowest height that still has pending events.
    pub fn lowest_pending_height(&self) -> Option<u64> {
        self.pending_by_height.keys().next().copied()
    }
}
