//! # Persistence
//!
//! A node restarted over the same data directory resumes from its saved
//! chain without replaying the log.

use std::path::Path;
use std::sync::Arc;

use pl_02_ingest_store::{EventStatus, FileBackedKVStore, IngestStore};
use pl_03_consensus::{ConsensusApi, FileChainRepository};
use pl_04_gossip::InMemoryHub;
use shared_types::ManualTimeSource;
use tempfile::TempDir;

use crate::fixtures::{NodeOptions, Submitter, TestNode, START};

fn open_node(dir: &Path, ingest_file: &str, clock: &Arc<ManualTimeSource>) -> TestNode {
    let kv = FileBackedKVStore::open(dir.join(ingest_file)).unwrap();
    let ingest = Arc::new(IngestStore::with_time_source(Box::new(kv), clock.clone()).unwrap());
    TestNode::spawn_with_ingest(
        &InMemoryHub::new(),
        clock,
        "node-a",
        ingest,
        NodeOptions {
            repository: Arc::new(FileChainRepository::new(dir.join("chain.json"))),
            ..NodeOptions::default()
        },
    )
}

#[tokio::test]
async fn test_restart_resumes_from_saved_chain() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualTimeSource::new(START));
    let alice = Submitter::new("alice");

    let head_hash = {
        let node = open_node(dir.path(), "ingest.log", &clock);
        let first = node.engine.bootstrap().unwrap();
        assert!(!first.loaded_from_disk);
        for i in 1..=3 {
            node.submit(&alice.event(&format!("evt-{}", i), i, 1.0)).await;
        }
        assert_eq!(node.drain(), 3);
        node.engine.snapshot().head().block_hash.clone()
    };

    let node = open_node(dir.path(), "ingest.log", &clock);
    let report = node.engine.bootstrap().unwrap();
    assert!(report.loaded_from_disk);
    assert_eq!(report.head_index, 3);
    assert_eq!(report.chain_length, 4);
    assert_eq!(report.reconciled, 0);
    assert_eq!(node.engine.snapshot().head().block_hash, head_hash);

    // Nothing is replayed; every event kept its accepted status.
    assert_eq!(node.drain(), 0);
    for i in 1..=3 {
        assert_eq!(
            node.ingest.status(&format!("evt-{}", i)).unwrap(),
            Some(EventStatus::Accepted { block_index: i })
        );
    }

    node.submit(&alice.event("evt-4", 4, 1.0)).await;
    assert_eq!(node.drain(), 1);
    assert_eq!(node.head_index(), 4);
}

#[tokio::test]
async fn test_bootstrap_reconciles_events_already_in_chain() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualTimeSource::new(START));
    let alice = Submitter::new("alice");
    let events: Vec<_> = (1..=3)
        .map(|i| alice.event(&format!("evt-{}", i), i, 1.0))
        .collect();

    {
        let node = open_node(dir.path(), "ingest.log", &clock);
        node.engine.bootstrap().unwrap();
        for event in &events {
            node.submit(event).await;
        }
        node.drain();
    }

    // A log that never saw the status updates, as after a crash between
    // saving a block and marking its event.
    let node = open_node(dir.path(), "ingest-fresh.log", &clock);
    for event in &events {
        node.ingest.append(event.clone()).unwrap();
    }
    let report = node.engine.bootstrap().unwrap();
    assert_eq!(report.reconciled, 3);
    assert_eq!(node.drain(), 0);

    let (_, json) = node.get("/events/evt-2").await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["block_index"], 2);
}
