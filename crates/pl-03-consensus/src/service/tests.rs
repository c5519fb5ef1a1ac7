use super::*;
use crate::adapters::InMemoryChainRepository;
use crate::domain::{DesyncCause, PersistedChain, DAMPING_FACTOR};
use ed25519_dalek::{Signer, SigningKey};
use pl_01_signature_verification::SignatureVerificationService;
use shared_types::{signing_message, Capacity, ManualTimeSource};

const START: u64 = 1_700_000_000;

struct Harness {
    engine: Arc<ConsensusEngine>,
    ingest: Arc<IngestStore>,
    repo: Arc<InMemoryChainRepository>,
    clock: Arc<ManualTimeSource>,
    key: SigningKey,
}

fn harness_with(config: ConsensusConfig, repo: Arc<InMemoryChainRepository>) -> Harness {
    let clock = Arc::new(ManualTimeSource::new(START));
    let ingest = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
    let engine = Arc::new(ConsensusEngine::new(ConsensusDependencies {
        ingest: ingest.clone(),
        verifier: Arc::new(SignatureVerificationService::new()),
        repository: repo.clone(),
        time_source: clock.clone(),
        config,
    }));
    Harness {
        engine,
        ingest,
        repo,
        clock,
        key: SigningKey::generate(&mut rand::rngs::OsRng),
    }
}

fn harness() -> Harness {
    harness_with(
        ConsensusConfig::default(),
        Arc::new(InMemoryChainRepository::new()),
    )
}

fn bootstrapped() -> Harness {
    let h = harness();
    h.engine.bootstrap().unwrap();
    h
}

fn signed(key: &SigningKey, id: &str, block_index: u64, work_score: f64, timestamp: i64) -> BlockEvent {
    let mut event = BlockEvent {
        event_id: id.to_string(),
        block_index,
        block_hash: format!("{:064x}", block_index * 1_000 + id.len() as u64),
        content_id: format!("bafy-{}", id),
        miner_address: format!("miner-{}", id),
        capacity: Capacity::Server,
        work_score,
        timestamp,
        signature: String::new(),
        public_key: hex::encode(key.verifying_key().to_bytes()),
    };
    event.signature = hex::encode(key.sign(&signing_message(&event)).to_bytes());
    event
}

impl Harness {
    fn submit(&self, id: &str, block_index: u64, work_score: f64, timestamp: i64) {
        self.ingest
            .append(signed(&self.key, id, block_index, work_score, timestamp))
            .unwrap();
    }

    fn drain(&self) -> Vec<ProcessOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = self.engine.process_next().unwrap();
            if outcome.is_idle() {
                return outcomes;
            }
            outcomes.push(outcome);
        }
    }

    fn status_of(&self, id: &str) -> EventStatus {
        self.ingest.status(id).unwrap().unwrap()
    }
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

#[test]
fn test_bootstrap_creates_and_persists_genesis() {
    let h = harness();
    assert_eq!(h.engine.status(), EngineStatus::Bootstrapping);

    let report = h.engine.bootstrap().unwrap();

    assert_eq!(report.head_index, 0);
    assert!(!report.loaded_from_disk);
    assert_eq!(report.location, "in-memory");
    assert_eq!(h.repo.save_count(), 1);
    assert_eq!(h.engine.status(), EngineStatus::Running);
}

#[test]
fn test_process_before_bootstrap_is_not_ready() {
    let h = harness();
    h.submit("e1", 1, 1.0, 1);
    assert!(matches!(
        h.engine.process_next(),
        Err(ConsensusError::NotReady("bootstrapping"))
    ));
    assert_eq!(h.status_of("e1"), EventStatus::Pending);
}

#[test]
fn test_bootstrap_rejects_corrupt_chain() {
    let repo = Arc::new(InMemoryChainRepository::new());
    let mut persisted: PersistedChain = ChainState::new().to_persisted();
    persisted.blocks[0].block_hash = "bad".to_string();
    repo.replace(Some(persisted));

    let h = harness_with(ConsensusConfig::default(), repo);
    assert!(matches!(
        h.engine.bootstrap(),
        Err(ConsensusError::CorruptChain(_))
    ));
    assert_eq!(h.engine.status(), EngineStatus::Bootstrapping);
    assert!(h.engine.status_report().last_error.is_some());
}

#[test]
fn test_restart_reloads_chain_without_replay() {
    let repo = Arc::new(InMemoryChainRepository::new());
    let first = harness_with(ConsensusConfig::default(), repo.clone());
    first.engine.bootstrap().unwrap();
    first.submit("e1", 1, 1.0, 1);
    first.submit("e2", 2, 1.0, 2);
    first.drain();

    let second = harness_with(ConsensusConfig::default(), repo);
    let report = second.engine.bootstrap().unwrap();

    assert!(report.loaded_from_disk);
    assert_eq!(report.head_index, 2);
    assert_eq!(
        second.engine.snapshot().blocks(),
        first.engine.snapshot().blocks()
    );
}

#[test]
fn test_bootstrap_reconciles_pending_events_already_in_chain() {
    let h = bootstrapped();
    h.submit("e1", 1, 1.0, 1);
    h.drain();

    // A second log that never saw the outcome, as after a crash between
    // persisting the block and marking the event.
    let clock = Arc::new(ManualTimeSource::new(START));
    let fresh_log = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
    fresh_log
        .append(signed(&h.key, "e1", 1, 1.0, 1))
        .unwrap();

    let engine = ConsensusEngine::new(ConsensusDependencies {
        ingest: fresh_log.clone(),
        verifier: Arc::new(SignatureVerificationService::new()),
        repository: h.repo.clone(),
        time_source: clock,
        config: ConsensusConfig::default(),
    });
    let report = engine.bootstrap().unwrap();

    assert_eq!(report.reconciled, 1);
    assert_eq!(
        fresh_log.status("e1").unwrap(),
        Some(EventStatus::Accepted { block_index: 1 })
    );
    assert!(engine.process_next().unwrap().is_idle());
}

// =============================================================================
// PROCESSING
// =============================================================================

#[test]
fn test_valid_event_advances_head_by_one() {
    let h = bootstrapped();
    h.submit("e1", 1, 4.0, 100);

    let outcome = h.engine.process_next().unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::Accepted {
            event_id: "e1".to_string(),
            block_index: 1,
            superseded: vec![],
        }
    );
    let chain = h.engine.snapshot();
    assert_eq!(chain.head_index(), 1);
    assert_eq!(h.status_of("e1"), EventStatus::Accepted { block_index: 1 });

    let block = chain.head();
    let config = ConsensusConfig::default();
    assert_eq!(block.parent_hash, chain.block(0).unwrap().block_hash);
    assert_eq!(block.event_id, "e1");
    assert_eq!(block.miner_address, "miner-e1");
    assert_eq!(block.timestamp, 100);
    assert_eq!(block.gas_used, config.base_gas + 4_000);
    assert!((block.cumulative_work_score - 4.0).abs() < 1e-12);
    assert!((block.reward - config.base_reward * DAMPING_FACTOR).abs() < 1e-12);
    assert_eq!(h.repo.save_count(), 2);
}

#[test]
fn test_idle_when_nothing_pending() {
    let h = bootstrapped();
    assert_eq!(h.engine.process_next().unwrap(), ProcessOutcome::Idle);
}

#[test]
fn test_bad_signature_rejected_and_processing_continues() {
    let h = bootstrapped();
    let mut forged = signed(&h.key, "forged", 1, 9.0, 1);
    forged.work_score = 90.0;
    h.ingest.append(forged).unwrap();
    h.submit("honest", 1, 1.0, 2);

    let outcomes = h.drain();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        h.status_of("forged"),
        EventStatus::Rejected {
            reason: RejectReason::InvalidSignature
        }
    );
    assert_eq!(h.status_of("honest"), EventStatus::Accepted { block_index: 1 });
    assert_eq!(h.engine.snapshot().head_index(), 1);
}

#[test]
fn test_malformed_key_is_invalid_format() {
    let h = bootstrapped();
    let mut event = signed(&h.key, "e1", 1, 1.0, 1);
    event.public_key = "zz".repeat(32);
    h.ingest.append(event).unwrap();

    let outcome = h.engine.process_next().unwrap();
    assert!(matches!(
        outcome,
        ProcessOutcome::Rejected {
            reason: RejectReason::InvalidFormat { .. },
            ..
        }
    ));
}

#[test]
fn test_out_of_order_index_rejected() {
    let h = bootstrapped();
    h.submit("future", 3, 1.0, 1);

    let outcome = h.engine.process_next().unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::Rejected {
            event_id: "future".to_string(),
            reason: RejectReason::OutOfOrderIndex {
                expected: 1,
                actual: 3
            },
        }
    );
    assert_eq!(h.engine.snapshot().head_index(), 0);
}

#[test]
fn test_fork_higher_work_score_wins() {
    let h = bootstrapped();
    // The lighter event is older, so it triggers processing.
    h.submit("light", 1, 1.0, 10);
    h.submit("heavy", 1, 2.0, 20);

    let outcome = h.engine.process_next().unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::Accepted {
            event_id: "heavy".to_string(),
            block_index: 1,
            superseded: vec!["light".to_string()],
        }
    );
    assert_eq!(h.status_of("heavy"), EventStatus::Accepted { block_index: 1 });
    assert_eq!(
        h.status_of("light"),
        EventStatus::Rejected {
            reason: RejectReason::Superseded {
                winner: "heavy".to_string()
            }
        }
    );
    assert!(h.engine.process_next().unwrap().is_idle());
    assert_eq!(h.engine.status_report().superseded, 1);
}

#[test]
fn test_fork_ignores_invalid_sibling() {
    let h = bootstrapped();
    h.submit("valid", 1, 1.0, 10);
    let mut forged = signed(&h.key, "forged", 1, 5.0, 20);
    forged.work_score = 500.0;
    h.ingest.append(forged).unwrap();

    let outcome = h.engine.process_next().unwrap();

    assert!(matches!(
        outcome,
        ProcessOutcome::Accepted { ref event_id, .. } if event_id == "valid"
    ));
    assert_eq!(
        h.status_of("forged"),
        EventStatus::Rejected {
            reason: RejectReason::InvalidSignature
        }
    );
}

#[test]
fn test_late_sibling_after_height_filled_is_out_of_order() {
    let h = bootstrapped();
    h.submit("first", 1, 1.0, 10);
    h.drain();
    h.submit("late", 1, 99.0, 20);

    let outcome = h.engine.process_next().unwrap();
    assert!(matches!(
        outcome,
        ProcessOutcome::Rejected {
            reason: RejectReason::OutOfOrderIndex {
                expected: 2,
                actual: 1
            },
            ..
        }
    ));
}

#[test]
fn test_chain_indices_dense_over_many_events() {
    let h = bootstrapped();
    for i in 1..=25u64 {
        h.submit(&format!("e{}", i), i, i as f64 * 0.5, i as i64);
    }
    h.drain();

    let chain = h.engine.snapshot();
    assert_eq!(chain.len(), 26);
    for (i, block) in chain.blocks().iter().enumerate() {
        assert_eq!(block.index, i as u64);
        if i > 0 {
            assert_eq!(block.parent_hash, chain.blocks()[i - 1].block_hash);
        }
    }
    let expected_work: f64 = (1..=25).map(|i| i as f64 * 0.5).sum();
    assert!((chain.cumulative_work_score() - expected_work).abs() < 1e-9);
}

#[test]
fn test_snapshot_is_isolated_from_later_writes() {
    let h = bootstrapped();
    let before = h.engine.snapshot();
    h.submit("e1", 1, 1.0, 1);
    h.drain();

    assert_eq!(before.head_index(), 0);
    assert_eq!(h.engine.snapshot().head_index(), 1);
}

struct FailingRepository;

impl ChainStateRepository for FailingRepository {
    fn load(&self) -> ConsensusResult<Option<PersistedChain>> {
        Ok(Some(ChainState::new().to_persisted()))
    }

    fn save(&self, _chain: &PersistedChain) -> ConsensusResult<()> {
        Err(ConsensusError::Persistence("disk full".to_string()))
    }

    fn location(&self) -> String {
        "failing".to_string()
    }
}

#[test]
fn test_failed_persist_rolls_back_and_leaves_event_pending() {
    let clock = Arc::new(ManualTimeSource::new(START));
    let ingest = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
    let engine = ConsensusEngine::new(ConsensusDependencies {
        ingest: ingest.clone(),
        verifier: Arc::new(SignatureVerificationService::new()),
        repository: Arc::new(FailingRepository),
        time_source: clock,
        config: ConsensusConfig::default(),
    });
    engine.bootstrap().unwrap();
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    ingest.append(signed(&key, "e1", 1, 1.0, 1)).unwrap();

    assert!(matches!(
        engine.process_next(),
        Err(ConsensusError::Persistence(_))
    ));
    assert_eq!(engine.snapshot().head_index(), 0);
    assert_eq!(ingest.status("e1").unwrap(), Some(EventStatus::Pending));
}

#[test]
fn test_file_chain_with_arbitrary_work_scores_reloads() {
    use crate::adapters::FileChainRepository;
    use rand::Rng;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let mut rng = rand::thread_rng();

    let engine_over = |ingest: Arc<IngestStore>| {
        ConsensusEngine::new(ConsensusDependencies {
            ingest,
            verifier: Arc::new(SignatureVerificationService::new()),
            repository: Arc::new(FileChainRepository::new(&path)),
            time_source: Arc::new(ManualTimeSource::new(START)),
            config: ConsensusConfig::default(),
        })
    };

    let ingest = Arc::new(IngestStore::in_memory());
    let engine = engine_over(ingest.clone());
    engine.bootstrap().unwrap();
    for i in 1..=200u64 {
        let work_score: f64 = rng.gen_range(0.0..10.0);
        ingest
            .append(signed(&key, &format!("e{}", i), i, work_score, i as i64))
            .unwrap();
        assert!(!engine.process_next().unwrap().is_idle());
    }
    let written = engine.snapshot();

    let reopened = engine_over(Arc::new(IngestStore::in_memory()));
    let report = reopened.bootstrap().unwrap();
    assert!(report.loaded_from_disk);
    assert_eq!(report.head_index, 200);
    assert_eq!(reopened.snapshot().head(), written.head());
}

/// Signals when `save` starts, then holds it until released.
struct SlowRepository {
    inner: InMemoryChainRepository,
    save_started: Mutex<Option<std::sync::mpsc::Sender<()>>>,
    hold: std::time::Duration,
}

impl ChainStateRepository for SlowRepository {
    fn load(&self) -> ConsensusResult<Option<PersistedChain>> {
        self.inner.load()
    }

    fn save(&self, chain: &PersistedChain) -> ConsensusResult<()> {
        if let Some(started) = self.save_started.lock().take() {
            let _ = started.send(());
            std::thread::sleep(self.hold);
        }
        self.inner.save(chain)
    }

    fn location(&self) -> String {
        "slow".to_string()
    }
}

#[test]
fn test_snapshot_stays_readable_while_block_is_persisted() {
    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let repository = Arc::new(SlowRepository {
        inner: InMemoryChainRepository::new(),
        save_started: Mutex::new(None),
        hold: std::time::Duration::from_millis(500),
    });
    let clock = Arc::new(ManualTimeSource::new(START));
    let ingest = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
    let engine = Arc::new(ConsensusEngine::new(ConsensusDependencies {
        ingest: ingest.clone(),
        verifier: Arc::new(SignatureVerificationService::new()),
        repository: repository.clone(),
        time_source: clock,
        config: ConsensusConfig::default(),
    }));
    engine.bootstrap().unwrap();
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    ingest.append(signed(&key, "e1", 1, 1.0, 1)).unwrap();
    *repository.save_started.lock() = Some(started_tx);

    let writer = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.process_next())
    };
    started_rx.recv().unwrap();

    let began = std::time::Instant::now();
    let during = engine.snapshot();
    assert!(began.elapsed() < std::time::Duration::from_millis(100));
    // Not published until the save completes.
    assert_eq!(during.head_index(), 0);

    assert!(!writer.join().unwrap().unwrap().is_idle());
    assert_eq!(engine.snapshot().head_index(), 1);
}

// =============================================================================
// DESYNC
// =============================================================================

#[test]
fn test_stale_pending_at_filled_height_desyncs_until_processed() {
    let h = bootstrapped();
    h.submit("e1", 1, 1.0, 1);
    h.drain();
    h.submit("straggler", 1, 1.0, 2);

    h.clock.advance(ConsensusConfig::default().staleness_window_secs + 1);
    let report = h.engine.check_desync_now().unwrap();

    assert!(report.desynced);
    assert!(matches!(
        report.cause,
        Some(DesyncCause::StalePending {
            count: 1,
            lowest_index: 1
        })
    ));
    assert_eq!(h.engine.status(), EngineStatus::Desynced);

    // Desynced engines keep processing; catching up clears the condition.
    h.drain();
    let report = h.engine.check_desync_now().unwrap();
    assert!(!report.desynced);
    assert_eq!(h.engine.status(), EngineStatus::Running);
}

#[test]
fn test_index_gap_must_persist_for_staleness_window() {
    let config = ConsensusConfig {
        max_index_gap: 3,
        staleness_window_secs: 60,
        ..ConsensusConfig::default()
    };
    let h = harness_with(config, Arc::new(InMemoryChainRepository::new()));
    h.engine.bootstrap().unwrap();
    for i in 1..=10u64 {
        h.submit(&format!("e{}", i), i, 1.0, i as i64);
    }

    assert!(!h.engine.check_desync_now().unwrap().desynced);
    h.clock.advance(59);
    assert!(!h.engine.check_desync_now().unwrap().desynced);
    h.clock.advance(1);
    let report = h.engine.check_desync_now().unwrap();
    assert!(report.desynced);
    assert_eq!(report.gap, 10);

    h.drain();
    assert!(!h.engine.check_desync_now().unwrap().desynced);
}

#[test]
fn test_rejected_events_do_not_count_toward_gap() {
    let config = ConsensusConfig {
        max_index_gap: 3,
        staleness_window_secs: 0,
        ..ConsensusConfig::default()
    };
    let h = harness_with(config, Arc::new(InMemoryChainRepository::new()));
    h.engine.bootstrap().unwrap();
    h.submit("far", 50, 1.0, 1);
    h.drain();

    assert!(!h.engine.check_desync_now().unwrap().desynced);
}

#[test]
fn test_recovery_cycle() {
    let h = bootstrapped();
    h.engine.begin_recovery();
    assert_eq!(h.engine.status(), EngineStatus::Recovering);
    assert!(h.engine.process_next().is_err());

    h.engine.bootstrap().unwrap();
    assert_eq!(h.engine.status(), EngineStatus::Running);
    assert_eq!(h.engine.status_report().bootstraps, 2);
}

// =============================================================================
// LOOP
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_loop_processes_and_stops_on_shutdown() {
    let h = bootstrapped();
    for i in 1..=3u64 {
        h.submit(&format!("e{}", i), i, 1.0, i as i64);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(h.engine.clone().run(shutdown_rx));

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(h.engine.snapshot().head_index(), 3);

    h.submit("e4", 4, 1.0, 4);
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(h.engine.snapshot().head_index(), 4);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}
