//! # Fork Choice
//!
//! Several valid events may claim the same height. The heaviest claim wins:
//!
//! 1. higher `work_score`
//! 2. lexicographically smaller `block_hash`
//! 3. lexicographically smaller `event_id`
//!
//! The last rule only matters for two events with identical score and hash,
//! and keeps the choice independent of arrival order.

use shared_types::BlockEvent;
use std::cmp::Ordering;

/// `Greater` means `a` is preferred over `b`.
pub fn compare_candidates(a: &BlockEvent, b: &BlockEvent) -> Ordering {
    a.work_score
        .total_cmp(&b.work_score)
        .then_with(|| b.block_hash.cmp(&a.block_hash))
        .then_with(|| b.event_id.cmp(&a.event_id))
}

/// Pick the winning candidate, if any.
pub fn select_winner<'a, I>(candidates: I) -> Option<&'a BlockEvent>
where
    I: IntoIterator<Item = &'a BlockEvent>,
{
    candidates
        .into_iter()
        .max_by(|a, b| compare_candidates(a, b))
}
