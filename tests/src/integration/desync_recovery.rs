//! # Desync Recovery
//!
//! The log runs ahead of a stalled engine; the supervisor restarts it once
//! and the node catches up.

use std::sync::Arc;
use std::time::Duration;

use pl_03_consensus::{ConsensusApi, ConsensusConfig, EngineStatus};
use pl_04_gossip::InMemoryHub;
use pl_05_health_supervisor::SupervisorConfig;
use shared_types::ManualTimeSource;

use crate::fixtures::{NodeOptions, Submitter, TestNode, START};

fn touchy_node() -> TestNode {
    let hub = InMemoryHub::new();
    let clock = Arc::new(ManualTimeSource::new(START));
    TestNode::spawn(
        &hub,
        &clock,
        "node-a",
        NodeOptions {
            consensus: ConsensusConfig {
                max_index_gap: 3,
                staleness_window_secs: 0,
                idle_poll_interval: Duration::from_millis(20),
                ..ConsensusConfig::default()
            },
            supervisor: SupervisorConfig {
                restart_budget: 2,
                ..SupervisorConfig::default()
            },
            ..NodeOptions::default()
        },
    )
}

async fn wait_for_head(node: &TestNode, target: u64) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while node.head_index() < target && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_desync_is_recovered_with_exactly_one_restart() {
    let node = touchy_node();
    // Bootstrapped without a processing loop, so the log runs ahead.
    node.engine.bootstrap().unwrap();
    let alice = Submitter::new("alice");
    for i in 1..=10 {
        node.submit(&alice.event(&format!("evt-{}", i), i, 1.0)).await;
    }

    let first = node.supervisor.poll_once().await.unwrap();
    assert!(first.desync_detected);
    assert_eq!(first.restart_count, 0);

    let (_, status) = node.get("/health/status").await;
    assert_eq!(status["desynced"], true);

    let second = node.supervisor.poll_once().await.unwrap();
    assert_eq!(second.restart_count, 1);
    assert!(node.supervisor.is_engine_loop_running());

    wait_for_head(&node, 10).await;

    let third = node.supervisor.poll_once().await.unwrap();
    assert!(!third.desync_detected);
    assert_eq!(third.restart_count, 1);
    assert_eq!(third.chain_head_index, 10);
    assert_eq!(node.engine.status(), EngineStatus::Running);

    let (_, consensus) = node.get("/health/consensus").await;
    assert_eq!(consensus["supervisor"]["restart_count"], 1);
    assert_eq!(consensus["supervisor"]["desync_detected"], false);
    assert_eq!(consensus["engine"]["bootstraps"], 2);

    node.supervisor.stop().await;
}

#[tokio::test]
async fn test_manual_restarts_share_the_budget() {
    let node = touchy_node();
    node.supervisor.start().unwrap();

    let (first, _) = node.post("/health/consensus/restart").await;
    let (second, _) = node.post("/health/consensus/restart").await;
    let (third, body) = node.post("/health/consensus/restart").await;

    assert_eq!(first, axum::http::StatusCode::OK);
    assert_eq!(second, axum::http::StatusCode::OK);
    assert_eq!(third, axum::http::StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "restart_budget_exceeded");
    assert!(node.supervisor.is_fatal());

    let (_, services) = node.get("/health/services").await;
    let supervisor = services["services"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "health-supervisor")
        .unwrap()
        .clone();
    assert_eq!(supervisor["detail"], "restart budget exhausted");

    node.supervisor.stop().await;
}
