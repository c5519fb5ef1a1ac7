//! # Canonical Signing Encoding
//!
//! The byte string a submitter signs for a `BlockEvent`.
//!
//! ```text
//! "proof-ledger/block-event/v1"
//! event_id | block_index | block_hash | content_id | miner_address
//! capacity | work_score  | timestamp  | public_key
//! ```
//!
//! - strings: `u32 LE length || UTF-8 bytes`
//! - `block_index`: `u64 LE`
//! - `work_score`: IEEE-754 bit pattern as `u64 LE`
//! - `timestamp`: `i64 LE`
//! - `capacity`: lowercase wire name, encoded as a string
//! - `public_key`: lowercased hex, encoded as a string
//!
//! `signature` is the only field left out. Any change here invalidates every
//! signature ever issued, so a new layout needs a new tag.

use crate::entities::BlockEvent;

/// Domain separation tag for version 1 of the encoding.
pub const SIGNING_DOMAIN_TAG: &[u8] = b"proof-ledger/block-event/v1";

/// Build the message bytes covered by `event.signature`.
pub fn signing_message(event: &BlockEvent) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        SIGNING_DOMAIN_TAG.len()
            + event.event_id.len()
            + event.block_hash.len()
            + event.content_id.len()
            + event.miner_address.len()
            + event.public_key.len()
            + 64,
    );

    out.extend_from_slice(SIGNING_DOMAIN_TAG);
    put_str(&mut out, &event.event_id);
    out.extend_from_slice(&event.block_index.to_le_bytes());
    put_str(&mut out, &event.block_hash);
    put_str(&mut out, &event.content_id);
    put_str(&mut out, &event.miner_address);
    put_str(&mut out, event.capacity.as_str());
    out.extend_from_slice(&event.work_score.to_bits().to_le_bytes());
    out.extend_from_slice(&event.timestamp.to_le_bytes());
    put_str(&mut out, &event.public_key.to_ascii_lowercase());
    out
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}
