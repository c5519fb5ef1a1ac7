//! Ingest Store Service
//!
//! The append-only event log. Records live in a `KeyValueStore` under
//! `ev:<event_id>` as bincode; the secondary indices in
//! [`EventIndex`](crate::domain::index::EventIndex) are rebuilt on open.
//!
//! # Concurrency
//! - Many writers: `append` serializes on one write lock and the only
//!   conflict it resolves is a duplicate `event_id`.
//! - Readers (`unprocessed`, `recent`, gossip scans) take the read lock for
//!   one page at a time and never hold it across an `await`.

mod unprocessed;


pub use unprocessed::Unprocessed;

use crate::adapters::InMemoryKVStore;
use crate::domain::entities::{EventStatus, IngestStats, StoredEvent};
use crate::domain::errors::{IngestError, IngestResult};
use crate::domain::index::{EventIndex, OrderKey};
use crate::ports::outbound::KeyValueStore;
use parking_lot::RwLock;
use shared_types::{BlockEvent, EventOutcome, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

const EVENT_PREFIX: &[u8] = b"ev:";

fn event_key(event_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(EVENT_PREFIX.len() + event_id.len());
    key.extend_from_slice(EVENT_PREFIX);
    key.extend_from_slice(event_id.as_bytes());
    key
}

fn order_key(record: &StoredEvent) -> OrderKey {
    OrderKey {
        timestamp: record.event.timestamp,
        block_index: record.event.block_index,
        sequence: record.sequence,
    }
}

struct Inner {
    kv: Box<dyn KeyValueStore>,
    index: EventIndex,
}

impl Inner {
    fn load(&self, event_id: &str) -> IngestResult<Option<StoredEvent>> {
        match self.kv.get(&event_key(event_id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_all(&self, ids: &[String]) -> IngestResult<Vec<StoredEvent>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(id)? {
                Some(record) => out.push(record),
                None => warn!("[pl-02] index references missing record {}", id),
            }
        }
        Ok(out)
    }
}

/// Durable append-only log of block events.
pub struct IngestStore {
    inner: RwLock<Inner>,
    time_source: Arc<dyn TimeSource>,
}

impl IngestStore {
    /// Open over an existing backend and rebuild the indices.
    pub fn open(kv: Box<dyn KeyValueStore>) -> IngestResult<Self> {
        Self::with_time_source(kv, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        kv: Box<dyn KeyValueStore>,
        time_source: Arc<dyn TimeSource>,
    ) -> IngestResult<Self> {
        let mut index = EventIndex::new();
        for (key, bytes) in kv.prefix_scan(EVENT_PREFIX)? {
            let record: StoredEvent = bincode::deserialize(&bytes)?;
            if !index.insert(
                record.event_id(),
                order_key(&record),
                record.ingested_at,
                &record.status,
            ) {
                warn!(
                    "[pl-02] duplicate record for key {}",
                    String::from_utf8_lossy(&key)
                );
            }
        }

        info!(
            location = %kv.describe(),
            events = index.len(),
            pending = index.pending_count(),
            last_sequence = index.last_sequence(),
            "[pl-02] 📒 Ingest store opened"
        );

        Ok(Self {
            inner: RwLock::new(Inner { kv, index }),
            time_source,
        })
    }

    /// Empty store over `InMemoryKVStore`.
    pub fn in_memory() -> Self {
        Self::in_memory_with_time_source(Arc::new(SystemTimeSource))
    }

    pub fn in_memory_with_time_source(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                kv: Box::new(InMemoryKVStore::new()),
                index: EventIndex::new(),
            }),
            time_source,
        }
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Append an event. No signature validation happens here.
    ///
    /// Returns the assigned ingest sequence.
    pub fn append(&self, event: BlockEvent) -> IngestResult<u64> {
        let mut inner = self.inner.write();

        if inner.index.contains(&event.event_id) {
            return Err(IngestError::DuplicateEvent {
                event_id: event.event_id,
            });
        }

        let record = StoredEvent {
            sequence: inner.index.last_sequence() + 1,
            ingested_at: self.time_source.now(),
            status: EventStatus::Pending,
            event,
        };
        let bytes = bincode::serialize(&record)?;
        inner.kv.put(&event_key(record.event_id()), &bytes)?;
        inner.index.insert(
            record.event_id(),
            order_key(&record),
            record.ingested_at,
            &record.status,
        );

        debug!(
            event_id = %record.event_id(),
            block_index = record.event.block_index,
            sequence = record.sequence,
            "[pl-02] event appended"
        );
        Ok(record.sequence)
    }

    /// Record a terminal outcome.
    ///
    /// Idempotent: returns `Ok(false)` when the event is already terminal and
    /// leaves its first outcome in place.
    pub fn mark_processed(&self, event_id: &str, outcome: EventOutcome) -> IngestResult<bool> {
        let mut inner = self.inner.write();

        let mut record = inner
            .load(event_id)?
            .ok_or_else(|| IngestError::NotFound {
                event_id: event_id.to_string(),
            })?;

        if record.status.is_terminal() {
            debug!(
                event_id,
                status = record.status.label(),
                "[pl-02] already terminal, outcome ignored"
            );
            return Ok(false);
        }

        record.status = outcome.into();
        let bytes = bincode::serialize(&record)?;
        inner.kv.put(&event_key(event_id), &bytes)?;
        inner.index.finalize(event_id, &record.status);
        Ok(true)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Pending events, oldest first by `(timestamp, block_index, sequence)`.
    ///
    /// Lazy and finite: only events already in the log when the iterator was
    /// created are yielded, at most `limit` of them. Calling it again
    /// restarts from the current oldest pending event.
    pub fn unprocessed(&self, limit: usize) -> Unprocessed<'_> {
        let ceiling = self.inner.read().index.last_sequence();
        Unprocessed::new(self, limit, ceiling)
    }

    pub(crate) fn pending_page(
        &self,
        cursor: Option<OrderKey>,
        ceiling: u64,
        page_size: usize,
    ) -> IngestResult<Vec<(OrderKey, StoredEvent)>> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        for (key, id) in inner.index.pending_after(cursor, ceiling, page_size) {
            if let Some(record) = inner.load(&id)? {
                out.push((key, record));
            }
        }
        Ok(out)
    }

    pub fn get(&self, event_id: &str) -> IngestResult<Option<StoredEvent>> {
        self.inner.read().load(event_id)
    }

    pub fn status(&self, event_id: &str) -> IngestResult<Option<EventStatus>> {
        Ok(self.get(event_id)?.map(|r| r.status))
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.inner.read().index.contains(event_id)
    }

    /// Newest first by `(timestamp, block_index)`.
    pub fn recent(&self, limit: usize) -> IngestResult<Vec<StoredEvent>> {
        let inner = self.inner.read();
        let ids = inner.index.recent(limit);
        inner.load_all(&ids)
    }

    /// Log-order scan of events with sequence greater than `after_sequence`.
    pub fn events_since(&self, after_sequence: u64, limit: usize) -> IngestResult<Vec<StoredEvent>> {
        let inner = self.inner.read();
        let ids = inner.index.since(after_sequence, limit);
        inner.load_all(&ids)
    }

    /// Pending events competing for `block_index`.
    pub fn pending_at_height(&self, block_index: u64) -> IngestResult<Vec<StoredEvent>> {
        let inner = self.inner.read();
        let ids = inner.index.pending_at_height(block_index);
        inner.load_all(&ids)
    }

    /// Pending events at heights `<= at_or_below` ingested before `older_than`
    /// (unix seconds).
    pub fn stale_pending(&self, at_or_below: u64, older_than: u64) -> IngestResult<Vec<StoredEvent>> {
        let inner = self.inner.read();
        let ids = inner.index.stale_pending(at_or_below, older_than);
        inner.load_all(&ids)
    }

    /// Highest `block_index` seen among events that are not rejected.
    pub fn max_known_index(&self) -> Option<u64> {
        self.inner.read().index.max_known_index()
    }

    /// Highest ingest sequence handed out; 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.inner.read().index.last_sequence()
    }

    pub fn stats(&self) -> IngestStats {
        let inner = self.inner.read();
        IngestStats {
            total: inner.index.len(),
            pending: inner.index.pending_count(),
            accepted: inner.index.accepted_count(),
            rejected: inner.index.rejected_count(),
            last_sequence: inner.index.last_sequence(),
        }
    }

    /// Backend location, for logs and health output.
    pub fn describe(&self) -> String {
        self.inner.read().kv.describe()
    }
}

impl std::fmt::Debug for IngestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestStore")
            .field("backend", &self.describe())
            .field("stats", &self.stats())
            .finish()
    }
}
