//! # Fork Choice
//!
//! Competing events at one height, on one node and across gossiping nodes.

use std::sync::Arc;

use pl_03_consensus::{ConsensusApi, DAMPING_FACTOR};
use pl_04_gossip::InMemoryHub;
use shared_types::ManualTimeSource;

use crate::fixtures::{gossip_round, NodeOptions, Submitter, TestNode, START};

#[tokio::test]
async fn test_heavier_sibling_wins_on_one_node() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let node = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::default());
    node.engine.bootstrap().unwrap();
    let alice = Submitter::new("alice");
    let bob = Submitter::new("bob");

    node.submit(&alice.event("light", 1, 1.0)).await;
    node.submit(&bob.event("heavy", 1, 2.0)).await;
    node.drain();

    let chain = node.engine.snapshot();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.head().event_id, "heavy");
    assert_eq!(chain.head().miner_address, "bob");

    let (_, light) = node.get("/events/light").await;
    assert_eq!(light["status"], "rejected");
    assert_eq!(light["reason_code"], "superseded");

    let (_, heavy) = node.get("/events/heavy").await;
    assert_eq!(heavy["status"], "accepted");
}

#[tokio::test]
async fn test_reward_is_damped_regardless_of_work() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let node = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::default());
    node.engine.bootstrap().unwrap();
    let alice = Submitter::new("alice");

    for (i, work) in [0.5, 5.0, 500.0, 50_000.0].iter().enumerate() {
        let height = i as u64 + 1;
        node.submit(&alice.event(&format!("w{}", height), height, *work)).await;
    }
    node.drain();

    let base_reward = node.engine.config().base_reward;
    for block in node.engine.snapshot().blocks().iter().skip(1) {
        assert!((block.reward - base_reward * DAMPING_FACTOR).abs() < 1e-9);
        assert!(block.reward < base_reward);
    }
}

#[tokio::test]
async fn test_gossiping_nodes_converge_on_heavier_sibling() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let a = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::with_peers(&["node-b"]));
    let b = TestNode::spawn(&hub, &clock, "node-b", NodeOptions::with_peers(&["node-a"]));
    a.engine.bootstrap().unwrap();
    b.engine.bootstrap().unwrap();

    let alice = Submitter::new("alice");
    let bob = Submitter::new("bob");
    a.submit(&alice.event("light", 1, 1.0)).await;
    b.submit(&bob.event("heavy", 1, 2.0)).await;

    gossip_round(&[&a, &b]).await;
    assert!(a.ingest.contains("heavy"));
    assert!(b.ingest.contains("light"));

    a.drain();
    b.drain();

    assert_eq!(a.engine.snapshot().head().event_id, "heavy");
    assert_eq!(b.engine.snapshot().head().event_id, "heavy");
    assert_eq!(
        a.engine.snapshot().head().block_hash,
        b.engine.snapshot().head().block_hash
    );
}
