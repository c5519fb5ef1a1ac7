//! # Gossip Flow
//!
//! Events submitted on one node reach and are accepted by the others.

use std::sync::Arc;
use std::time::Duration;

use pl_02_ingest_store::EventStatus;
use pl_03_consensus::ConsensusApi;
use pl_04_gossip::{InMemoryHub, PeerOrigin};
use shared_types::{ManualTimeSource, ServiceStatus};
use tokio::sync::watch;

use crate::fixtures::{gossip_round, NodeOptions, Submitter, TestNode, START};

#[tokio::test]
async fn test_event_submitted_on_one_node_is_accepted_on_another() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let a = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::with_peers(&["node-b"]));
    let b = TestNode::spawn(&hub, &clock, "node-b", NodeOptions::default());
    b.engine.bootstrap().unwrap();
    let alice = Submitter::new("alice");

    a.submit(&alice.event("evt-1", 1, 2.0)).await;
    gossip_round(&[&a, &b]).await;
    b.drain();

    assert_eq!(b.head_index(), 1);
    assert_eq!(
        b.ingest.status("evt-1").unwrap(),
        Some(EventStatus::Accepted { block_index: 1 })
    );
    let (_, json) = b.get("/events/evt-1").await;
    assert_eq!(json["status"], "accepted");

    // b learned a from the message and now counts it as a peer.
    let learned = b.gossip.peer("node-a").unwrap();
    assert_eq!(learned.origin, PeerOrigin::Learned);
}

#[tokio::test]
async fn test_events_relay_across_a_line_of_nodes() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let a = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::with_peers(&["node-b"]));
    let b = TestNode::spawn(&hub, &clock, "node-b", NodeOptions::with_peers(&["node-c"]));
    let c = TestNode::spawn(&hub, &clock, "node-c", NodeOptions::default());
    let alice = Submitter::new("alice");

    a.submit(&alice.event("evt-1", 1, 1.0)).await;

    gossip_round(&[&a, &b, &c]).await;
    assert!(b.ingest.contains("evt-1"));
    assert!(!c.ingest.contains("evt-1"));

    gossip_round(&[&a, &b, &c]).await;
    assert!(c.ingest.contains("evt-1"));

    // Nothing new arrives as a duplicate on a third round.
    gossip_round(&[&a, &b, &c]).await;
    assert_eq!(c.ingest.stats().total, 1);
}

#[tokio::test]
async fn test_partitioned_peer_catches_up_after_heal() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let a = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::with_peers(&["node-b"]));
    let b = TestNode::spawn(&hub, &clock, "node-b", NodeOptions::default());
    let alice = Submitter::new("alice");

    hub.set_partitioned("node-b", true);
    for i in 1..=3 {
        a.submit(&alice.event(&format!("evt-{}", i), i, 1.0)).await;
    }
    gossip_round(&[&a, &b]).await;
    assert_eq!(b.ingest.stats().total, 0);
    assert_eq!(a.gossip.stats().send_failures, 1);
    assert_eq!(a.gossip.peer("node-b").unwrap().consecutive_failures, 1);

    hub.set_partitioned("node-b", false);
    gossip_round(&[&a, &b]).await;
    assert_eq!(b.ingest.stats().total, 3);
    assert_eq!(a.gossip.peer("node-b").unwrap().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_loop_cadence_over_one_hundred_seconds() {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    let a = TestNode::spawn(&hub, &clock, "node-a", NodeOptions::with_peers(&["node-b"]));
    let _b = TestNode::spawn(&hub, &clock, "node-b", NodeOptions::default());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = a.gossip.spawn(shutdown_rx);
    tokio::time::sleep(Duration::from_secs(100)).await;

    let stats = a.gossip.stats();
    assert_eq!(stats.broadcast_rounds, 7);
    assert_eq!(stats.listen_rounds, 7);
    assert_eq!(stats.cleanup_rounds, 1);

    let services = a.supervisor.services();
    let gossip = services.iter().find(|s| s.name == "gossip").unwrap();
    assert_eq!(gossip.status, ServiceStatus::Running);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
    let services = a.supervisor.services();
    let gossip = services.iter().find(|s| s.name == "gossip").unwrap();
    assert_eq!(gossip.status, ServiceStatus::Stopped);
}
