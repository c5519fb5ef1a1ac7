//! # Submission Flow
//!
//! `POST /events` → ingest log → consensus engine → chain, read back over
//! the health and lookup endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use pl_03_consensus::ConsensusApi;
use pl_04_gossip::InMemoryHub;
use shared_types::ManualTimeSource;

use crate::fixtures::{NodeOptions, Submitter, TestNode, START};

fn single_node() -> TestNode {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let node = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::default());
    node.engine.bootstrap().unwrap();
    node
}

#[tokio::test]
async fn test_valid_event_advances_head_by_exactly_one() {
    let node = single_node();
    let alice = Submitter::new("alice");

    let (status, _) = node.submit(&alice.event("evt-1", 1, 3.0)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(node.head_index(), 0);

    assert_eq!(node.drain(), 1);
    assert_eq!(node.head_index(), 1);

    let (status, json) = node.get("/events/evt-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["accepted_block"], 1);

    let (_, chain) = node.get("/health/blockchain").await;
    assert_eq!(chain["length"], 2);
    assert_eq!(chain["head_index"], 1);
}

#[tokio::test]
async fn test_refused_submissions_never_reach_the_log() {
    let node = single_node();
    let alice = Submitter::new("alice");

    let mut forged = alice.event("evt-1", 1, 1.0);
    forged.miner_address = "mallory".to_string();
    let (status, json) = node.submit(&forged).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_signature");

    let mut garbled = alice.event("evt-2", 1, 1.0);
    garbled.signature = "not hex at all".to_string();
    let (status, json) = node.submit(&garbled).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_format");

    assert_eq!(node.ingest.stats().total, 0);
    assert_eq!(node.drain(), 0);
    assert_eq!(node.head_index(), 0);
}

#[tokio::test]
async fn test_out_of_order_event_is_rejected_and_processing_continues() {
    let node = single_node();
    let alice = Submitter::new("alice");

    node.submit(&alice.event("early", 3, 1.0)).await;
    node.submit(&alice.event("first", 1, 1.0)).await;
    node.drain();

    let (_, early) = node.get("/events/early").await;
    assert_eq!(early["status"], "rejected");
    assert_eq!(early["reason_code"], "out_of_order_index");

    let (_, first) = node.get("/events/first").await;
    assert_eq!(first["status"], "accepted");
    assert_eq!(node.head_index(), 1);
}

#[tokio::test]
async fn test_chain_indices_stay_dense() {
    let node = single_node();
    let alice = Submitter::new("alice");

    for i in 1..=12 {
        node.submit(&alice.event(&format!("evt-{}", i), i, i as f64)).await;
    }
    node.drain();

    let chain = node.engine.snapshot();
    assert_eq!(chain.len(), 13);
    for (i, block) in chain.blocks().iter().enumerate() {
        assert_eq!(block.index, i as u64);
    }
    for pair in chain.blocks().windows(2) {
        assert_eq!(pair[1].parent_hash, pair[0].block_hash);
    }
}

#[tokio::test]
async fn test_engine_loop_picks_up_submissions() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let node = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::default());
    node.supervisor.start().unwrap();
    let alice = Submitter::new("alice");

    node.submit(&alice.event("evt-1", 1, 1.0)).await;
    node.submit(&alice.event("evt-2", 2, 1.0)).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while node.head_index() < 2 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(node.head_index(), 2);

    let (_, status) = node.get("/health/status").await;
    assert_eq!(status["active"], true);
    assert_eq!(status["chain_head_index"], 2);
    assert_eq!(status["desynced"], false);

    node.supervisor.stop().await;
}
