//! Lazy iterator over pending events.

use super::IngestStore;
use crate::domain::entities::StoredEvent;
use crate::domain::errors::IngestResult;
use crate::domain::index::OrderKey;
use std::collections::VecDeque;

const PAGE_SIZE: usize = 64;

/// Pages through pending events under the read lock, one page at a time.
///
/// Events finalized between pages are skipped; events appended after the
/// iterator was created are never yielded.
pub struct Unprocessed<'a> {
    store: &'a IngestStore,
    cursor: Option<OrderKey>,
    remaining: usize,
    ceiling: u64,
    buffer: VecDeque<StoredEvent>,
    exhausted: bool,
}

impl<'a> Unprocessed<'a> {
    pub(super) fn new(store: &'a IngestStore, limit: usize, ceiling: u64) -> Self {
        Self {
            store,
            cursor: None,
            remaining: limit,
            ceiling,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> IngestResult<()> {
        let page_size = self.remaining.min(PAGE_SIZE);
        let page = self.store.pending_page(self.cursor, self.ceiling, page_size)?;
        if page.len() < page_size {
            self.exhausted = true;
        }
        for (key, record) in page {
            self.cursor = Some(key);
            self.buffer.push_back(record);
        }
        Ok(())
    }
}

impl Iterator for Unprocessed<'_> {
    type Item = IngestResult<StoredEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fill() {
                self.exhausted = true;
                self.remaining = 0;
                return Some(Err(e));
            }
        }

        let record = self.buffer.pop_front()?;
        self.remaining -= 1;
        Some(Ok(record))
    }
}
