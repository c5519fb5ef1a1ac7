//! # Proof Ledger Benchmarks
//!
//! | Subsystem | Operation | Target |
//! |-----------|-----------|--------|
//! | pl-01 Signature Verification | guard + Ed25519 verify | < 1ms |
//! | pl-02 Ingest Store | append to in-memory log | < 100µs |
//! | pl-03 Consensus | process one pending event | < 1ms |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::sync::Arc;
use std::time::Duration;

use pl_01_signature_verification::{verify_event, SignatureVerificationService};
use pl_02_ingest_store::IngestStore;
use pl_03_consensus::{
    ConsensusApi, ConsensusConfig, ConsensusDependencies, ConsensusEngine, InMemoryChainRepository,
};
use pl_tests::fixtures::{Submitter, START};
use shared_types::{BlockEvent, ManualTimeSource};

fn signed_events(count: u64) -> Vec<BlockEvent> {
    let submitter = Submitter::new("bench-miner");
    (1..=count)
        .map(|i| submitter.event(&format!("evt-{}", i), i, 1.5))
        .collect()
}

// ============================================================================
// PL-01: Signature Verification
// ============================================================================

fn bench_signature_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("pl-01-signature-verification");
    group.measurement_time(Duration::from_secs(10));

    let event = signed_events(1).remove(0);
    group.bench_function("verify_event_valid", |b| {
        b.iter(|| black_box(verify_event(black_box(&event)).is_ok()))
    });

    let mut malformed = event.clone();
    malformed.public_key = "zz".repeat(32);
    group.bench_function("verify_event_malformed_key", |b| {
        b.iter(|| black_box(verify_event(black_box(&malformed)).is_err()))
    });

    group.finish();
}

// ============================================================================
// PL-02: Ingest Store
// ============================================================================

fn bench_ingest_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("pl-02-ingest-store");

    for size in [100u64, 1_000] {
        let events = signed_events(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("append", size), &events, |b, events| {
            b.iter_batched(
                || {
                    (
                        IngestStore::in_memory_with_time_source(Arc::new(ManualTimeSource::new(
                            START,
                        ))),
                        events.clone(),
                    )
                },
                |(store, events)| {
                    for event in events {
                        black_box(store.append(event).is_ok());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// PL-03: Consensus
// ============================================================================

fn engine_with(events: &[BlockEvent]) -> ConsensusEngine {
    let clock = Arc::new(ManualTimeSource::new(START));
    let ingest = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
    for event in events {
        let _ = ingest.append(event.clone());
    }
    let engine = ConsensusEngine::new(ConsensusDependencies {
        ingest,
        verifier: Arc::new(SignatureVerificationService::new()),
        repository: Arc::new(InMemoryChainRepository::new()),
        time_source: clock,
        config: ConsensusConfig::default(),
    });
    let _ = engine.bootstrap();
    engine
}

fn bench_consensus_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pl-03-consensus");

    let size = 200u64;
    let events = signed_events(size);
    group.throughput(Throughput::Elements(size));
    group.bench_function("process_linear_chain", |b| {
        b.iter_batched(
            || engine_with(&events),
            |engine| {
                while let Ok(outcome) = engine.process_next() {
                    if outcome.is_idle() {
                        break;
                    }
                }
                black_box(engine.snapshot().head_index())
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_signature_verification,
    bench_ingest_append,
    bench_consensus_processing,
);

criterion_main!(benches);
