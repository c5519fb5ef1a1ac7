//! # Peer Table
//!
//! Advisory bookkeeping of who we gossip with. Nothing here is
//! authoritative for consensus.
//!
//! - Bootstrap peers come from configuration and are never pruned.
//! - Learned peers are added when they first message us and pruned once
//!   they go quiet for longer than the staleness window.

use serde::Serialize;
use std::collections::BTreeMap;

/// How a peer entered the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerOrigin {
    Bootstrap,
    Learned,
}

/// One known peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRecord {
    pub peer_address: String,
    /// Unix seconds of the last inbound message or successful delivery.
    pub last_seen: u64,
    /// Highest ingest sequence delivered to this peer.
    pub last_exchanged_index: u64,
    pub origin: PeerOrigin,
    /// Failed deliveries since the last success.
    pub consecutive_failures: u32,
}

impl PeerRecord {
    fn new(peer_address: String, origin: PeerOrigin, now: u64) -> Self {
        Self {
            peer_address,
            last_seen: now,
            last_exchanged_index: 0,
            origin,
            consecutive_failures: 0,
        }
    }
}

/// Peer records keyed by address.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: BTreeMap<String, PeerRecord>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configured peer. Re-adding an existing address pins it.
    pub fn add_bootstrap(&mut self, address: &str, now: u64) {
        self.peers
            .entry(address.to_string())
            .and_modify(|p| p.origin = PeerOrigin::Bootstrap)
            .or_insert_with(|| PeerRecord::new(address.to_string(), PeerOrigin::Bootstrap, now));
    }

    /// Note that `address` messaged us. Returns `true` if it was new.
    pub fn observe(&mut self, address: &str, now: u64) -> bool {
        match self.peers.get_mut(address) {
            Some(peer) => {
                peer.last_seen = peer.last_seen.max(now);
                false
            }
            None => {
                self.peers.insert(
                    address.to_string(),
                    PeerRecord::new(address.to_string(), PeerOrigin::Learned, now),
                );
                true
            }
        }
    }

    /// Delivery up to `sequence` succeeded.
    pub fn record_success(&mut self, address: &str, sequence: u64, now: u64) {
        if let Some(peer) = self.peers.get_mut(address) {
            peer.last_exchanged_index = peer.last_exchanged_index.max(sequence);
            peer.last_seen = peer.last_seen.max(now);
            peer.consecutive_failures = 0;
        }
    }

    pub fn record_failure(&mut self, address: &str) {
        if let Some(peer) = self.peers.get_mut(address) {
            peer.consecutive_failures = peer.consecutive_failures.saturating_add(1);
        }
    }

    /// Remove learned peers last seen before `cutoff`.
    pub fn prune(&mut self, cutoff: u64) -> Vec<String> {
        let stale: Vec<String> = self
            .peers
            .values()
            .filter(|p| p.origin == PeerOrigin::Learned && p.last_seen < cutoff)
            .map(|p| p.peer_address.clone())
            .collect();
        for address in &stale {
            self.peers.remove(address);
        }
        stale
    }

    /// Pull back cursors that point past the end of the log.
    pub fn clamp_cursors(&mut self, last_sequence: u64) -> usize {
        let mut clamped = 0;
        for peer in self.peers.values_mut() {
            if peer.last_exchanged_index > last_sequence {
                peer.last_exchanged_index = last_sequence;
                clamped += 1;
            }
        }
        clamped
    }

    /// `(address, cursor)` for every peer.
    pub fn targets(&self) -> Vec<(String, u64)> {
        self.peers
            .values()
            .map(|p| (p.peer_address.clone(), p.last_exchanged_index))
            .collect()
    }

    pub fn get(&self, address: &str) -> Option<&PeerRecord> {
        self.peers.get(address)
    }

    pub fn records(&self) -> Vec<PeerRecord> {
        self.peers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_adds_learned_peer_once() {
        let mut table = PeerTable::new();
        assert!(table.observe("10.0.0.1:7000", 5));
        assert!(!table.observe("10.0.0.1:7000", 9));

        let peer = table.get("10.0.0.1:7000").unwrap();
        assert_eq!(peer.origin, PeerOrigin::Learned);
        assert_eq!(peer.last_seen, 9);
    }

    #[test]
    fn test_cursor_only_moves_forward() {
        let mut table = PeerTable::new();
        table.add_bootstrap("a", 0);
        table.record_success("a", 10, 1);
        table.record_success("a", 4, 2);
        assert_eq!(table.get("a").unwrap().last_exchanged_index, 10);
    }

    #[test]
    fn test_failure_counter_resets_on_success() {
        let mut table = PeerTable::new();
        table.add_bootstrap("a", 0);
        table.record_failure("a");
        table.record_failure("a");
        assert_eq!(table.get("a").unwrap().consecutive_failures, 2);
        table.record_success("a", 1, 1);
        assert_eq!(table.get("a").unwrap().consecutive_failures, 0);
    }

    #[test]
    fn test_prune_keeps_bootstrap_peers() {
        let mut table = PeerTable::new();
        table.add_bootstrap("seed", 0);
        table.observe("quiet", 10);
        table.observe("chatty", 100);

        let pruned = table.prune(50);

        assert_eq!(pruned, vec!["quiet".to_string()]);
        assert!(table.get("seed").is_some());
        assert!(table.get("chatty").is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_bootstrap_pins_learned_peer() {
        let mut table = PeerTable::new();
        table.observe("p", 0);
        table.add_bootstrap("p", 0);
        assert!(table.prune(1_000).is_empty());
    }

    #[test]
    fn test_clamp_cursors() {
        let mut table = PeerTable::new();
        table.add_bootstrap("a", 0);
        table.add_bootstrap("b", 0);
        table.record_success("a", 50, 0);
        table.record_success("b", 5, 0);

        assert_eq!(table.clamp_cursors(20), 1);
        assert_eq!(table.get("a").unwrap().last_exchanged_index, 20);
        assert_eq!(table.get("b").unwrap().last_exchanged_index, 5);
    }
}
