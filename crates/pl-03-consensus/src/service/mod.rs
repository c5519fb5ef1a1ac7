//! Consensus Engine - Core business logic
//!
//! # Architecture
//! - Single writer: `process_lock` serializes `process_next` and `bootstrap`
//! - Zero-Trust signature re-verification
//! - Copy-on-write chain: readers hold `Arc` snapshots. The writer builds
//!   and persists the next chain off-lock, then swaps the `Arc` in.

#[cfg(test)]
mod tests;

use crate::domain::{
    calculate, compute_block_hash, evaluate_desync, select_winner, BootstrapReport, ChainState,
    ConsensusConfig, ConsensusError, ConsensusResult, DesyncInputs, DesyncReport,
    ProcessOutcome,
};
use crate::metrics;
use crate::ports::{ChainStateRepository, ConsensusApi};
use crate::state::{EngineState, EngineStatus, StatusReport};
use parking_lot::{Mutex, RwLock};
use pl_01_signature_verification::SignatureVerificationApi;
use pl_02_ingest_store::{EventStatus, IngestStore};
use shared_types::{Block, BlockEvent, EventOutcome, RejectReason, TimeSource};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Dependencies for ConsensusEngine
pub struct ConsensusDependencies {
    pub ingest: Arc<IngestStore>,
    pub verifier: Arc<dyn SignatureVerificationApi>,
    pub repository: Arc<dyn ChainStateRepository>,
    pub time_source: Arc<dyn TimeSource>,
    pub config: ConsensusConfig,
}

/// Consensus Engine
pub struct ConsensusEngine {
    config: ConsensusConfig,
    ingest: Arc<IngestStore>,
    verifier: Arc<dyn SignatureVerificationApi>,
    repository: Arc<dyn ChainStateRepository>,
    time_source: Arc<dyn TimeSource>,
    chain: RwLock<Arc<ChainState>>,
    state: EngineState,
    process_lock: Mutex<()>,
}

impl ConsensusEngine {
    /// Create an engine. Nothing is processed until `bootstrap` succeeds.
    pub fn new(deps: ConsensusDependencies) -> Self {
        Self {
            config: deps.config,
            ingest: deps.ingest,
            verifier: deps.verifier,
            repository: deps.repository,
            time_source: deps.time_source,
            chain: RwLock::new(Arc::new(ChainState::new())),
            state: EngineState::new(),
            process_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn ingest(&self) -> &Arc<IngestStore> {
        &self.ingest
    }

    /// `check_desync` at the engine's own clock.
    pub fn check_desync_now(&self) -> ConsensusResult<DesyncReport> {
        self.check_desync(self.time_source.now())
    }

    /// Processing loop. Runs until `shutdown` turns `true` or its sender is
    /// dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("[pl-03] ⚙️ Processing loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let idle = match self.process_next() {
                Ok(outcome) => outcome.is_idle(),
                Err(ConsensusError::NotReady(_)) => true,
                Err(e) => {
                    error!("[pl-03] processing failed: {}", e);
                    self.state.record_error(e.to_string());
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }

        info!("[pl-03] Processing loop stopped");
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Format and signature. `Err` carries the rejection reason.
    fn validate(&self, event: &BlockEvent) -> Result<(), RejectReason> {
        event
            .validate_format()
            .map_err(|e| RejectReason::InvalidFormat {
                detail: e.to_string(),
            })?;

        self.verifier.verify_event(event).map_err(|e| {
            if e.is_format_error() {
                RejectReason::InvalidFormat {
                    detail: e.to_string(),
                }
            } else {
                RejectReason::InvalidSignature
            }
        })
    }

    fn reject(&self, event_id: &str, reason: RejectReason) -> ConsensusResult<()> {
        let code = reason.code();
        let newly = self.ingest.mark_processed(
            event_id,
            EventOutcome::Rejected {
                reason: reason.clone(),
            },
        )?;
        if newly {
            EngineState::bump(&self.state.processed, 1);
            EngineState::bump(&self.state.rejected, 1);
            if matches!(reason, RejectReason::Superseded { .. }) {
                EngineState::bump(&self.state.superseded, 1);
            }
            metrics::record_event_rejected(code);
            debug!(event_id, reason = %reason, "[pl-03] event rejected");
        }
        Ok(())
    }

    fn process_event(&self, event: BlockEvent) -> ConsensusResult<ProcessOutcome> {
        if let Err(reason) = self.validate(&event) {
            self.reject(&event.event_id, reason.clone())?;
            return Ok(ProcessOutcome::Rejected {
                event_id: event.event_id,
                reason,
            });
        }

        let expected = self.snapshot().head_index() + 1;
        if event.block_index != expected {
            let reason = RejectReason::OutOfOrderIndex {
                expected,
                actual: event.block_index,
            };
            self.reject(&event.event_id, reason.clone())?;
            return Ok(ProcessOutcome::Rejected {
                event_id: event.event_id,
                reason,
            });
        }

        // Every valid pending sibling at this height competes.
        let mut candidates = vec![event];
        for sibling in self.ingest.pending_at_height(expected)? {
            if sibling.event.event_id == candidates[0].event_id {
                continue;
            }
            match self.validate(&sibling.event) {
                Ok(()) => candidates.push(sibling.event),
                Err(reason) => self.reject(&sibling.event.event_id, reason)?,
            }
        }

        let Some(winner) = select_winner(&candidates).cloned() else {
            return Ok(ProcessOutcome::Idle);
        };

        let block = self.append_block(&winner)?;
        self.ingest.mark_processed(
            &winner.event_id,
            EventOutcome::Accepted {
                block_index: block.index,
            },
        )?;
        EngineState::bump(&self.state.processed, 1);
        EngineState::bump(&self.state.accepted, 1);
        metrics::record_block_accepted(block.index, block.cumulative_work_score);

        let mut superseded = Vec::new();
        for loser in candidates.iter().filter(|c| c.event_id != winner.event_id) {
            self.reject(
                &loser.event_id,
                RejectReason::Superseded {
                    winner: winner.event_id.clone(),
                },
            )?;
            superseded.push(loser.event_id.clone());
        }

        info!(
            block_index = block.index,
            block_hash = %block.block_hash,
            event_id = %winner.event_id,
            work_score = block.work_score,
            reward = block.reward,
            superseded = superseded.len(),
            "[pl-03] ✅ Block appended"
        );

        Ok(ProcessOutcome::Accepted {
            event_id: winner.event_id,
            block_index: block.index,
            superseded,
        })
    }

    /// Build, append and persist the block for `event`. The published chain
    /// only changes after the save succeeds. Callers hold `process_lock`.
    fn append_block(&self, event: &BlockEvent) -> ConsensusResult<Block> {
        let current = self.snapshot();
        let parent = current.head().clone();

        let index = parent.index + 1;
        let economics = calculate(&self.config, event.work_score);
        let block = Block {
            index,
            block_hash: compute_block_hash(
                index,
                &parent.block_hash,
                &event.event_id,
                &event.miner_address,
                event.work_score,
                event.timestamp,
            ),
            parent_hash: parent.block_hash.clone(),
            event_id: event.event_id.clone(),
            work_score: event.work_score,
            cumulative_work_score: parent.cumulative_work_score + event.work_score,
            gas_used: economics.gas_used,
            gas_price: economics.gas_price,
            reward: economics.reward,
            miner_address: event.miner_address.clone(),
            timestamp: event.timestamp,
        };

        let mut next = ChainState::clone(&current);
        drop(current);
        next.append(block.clone())?;
        self.repository.save(&next.to_persisted())?;

        *self.chain.write() = Arc::new(next);
        Ok(block)
    }

    /// Mark pending log entries whose block already exists as accepted.
    ///
    /// Covers a crash between persisting a block and marking its event.
    fn reconcile(&self, chain: &ChainState) -> ConsensusResult<usize> {
        let mut reconciled = 0;
        for block in chain.blocks().iter().skip(1) {
            match self.ingest.status(&block.event_id)? {
                Some(EventStatus::Pending) => {
                    self.ingest.mark_processed(
                        &block.event_id,
                        EventOutcome::Accepted {
                            block_index: block.index,
                        },
                    )?;
                    reconciled += 1;
                }
                Some(_) => {}
                None => warn!(
                    block_index = block.index,
                    event_id = %block.event_id,
                    "[pl-03] block references an event missing from the ingest log"
                ),
            }
        }
        Ok(reconciled)
    }

    fn load_chain(&self) -> ConsensusResult<(ChainState, bool)> {
        match self.repository.load()? {
            Some(persisted) => Ok((ChainState::from_persisted(persisted)?, true)),
            None => {
                let chain = ChainState::new();
                self.repository.save(&chain.to_persisted())?;
                Ok((chain, false))
            }
        }
    }
}

impl ConsensusApi for ConsensusEngine {
    fn bootstrap(&self) -> ConsensusResult<BootstrapReport> {
        let _guard = self.process_lock.lock();

        if self.state.status() != EngineStatus::Recovering {
            self.state.set_status(EngineStatus::Bootstrapping);
        }

        let location = self.repository.location();
        let (chain, loaded_from_disk) = self.load_chain().map_err(|e| {
            error!(location = %location, "[pl-03] ❌ Bootstrap failed: {}", e);
            self.state.record_error(e.to_string());
            e
        })?;

        info!(
            location = %location,
            loaded_from_disk,
            head_index = chain.head_index(),
            "[pl-03] 📂 Chain state resolved"
        );

        let reconciled = self.reconcile(&chain)?;
        if reconciled > 0 {
            info!(reconciled, "[pl-03] Reconciled ingest log with chain");
        }

        let report = BootstrapReport {
            head_index: chain.head_index(),
            chain_length: chain.len(),
            location,
            loaded_from_disk,
            reconciled,
        };

        metrics::record_head(chain.head_index(), chain.cumulative_work_score());
        *self.chain.write() = Arc::new(chain);
        self.state.gap_tracker.lock().reset();
        EngineState::bump(&self.state.bootstraps, 1);
        self.state
            .bootstrapped_at
            .store(self.time_source.now(), std::sync::atomic::Ordering::Relaxed);
        self.state.set_status(EngineStatus::Running);

        Ok(report)
    }

    fn process_next(&self) -> ConsensusResult<ProcessOutcome> {
        let _guard = self.process_lock.lock();

        let status = self.state.status();
        if !status.accepts_work() {
            return Err(ConsensusError::NotReady(status.as_str()));
        }

        let record = match self.ingest.unprocessed(1).next() {
            None => return Ok(ProcessOutcome::Idle),
            Some(record) => record?,
        };

        let started = Instant::now();
        let outcome = self.process_event(record.event)?;
        metrics::record_processing_latency(started.elapsed().as_secs_f64());
        Ok(outcome)
    }

    fn snapshot(&self) -> Arc<ChainState> {
        self.chain.read().clone()
    }

    fn status(&self) -> EngineStatus {
        self.state.status()
    }

    fn status_report(&self) -> StatusReport {
        let chain = self.snapshot();
        let head = chain.head();
        let bootstrapped_at = EngineState::load(&self.state.bootstrapped_at);

        StatusReport {
            status: self.state.status(),
            head_index: head.index,
            head_hash: head.block_hash.clone(),
            chain_length: chain.len(),
            cumulative_work_score: head.cumulative_work_score,
            processed: EngineState::load(&self.state.processed),
            accepted: EngineState::load(&self.state.accepted),
            rejected: EngineState::load(&self.state.rejected),
            superseded: EngineState::load(&self.state.superseded),
            bootstraps: EngineState::load(&self.state.bootstraps),
            bootstrapped_at: (bootstrapped_at > 0).then_some(bootstrapped_at),
            pending_events: self.ingest.stats().pending,
            last_error: self.state.last_error(),
            last_desync: self.state.last_desync(),
        }
    }

    fn check_desync(&self, now: u64) -> ConsensusResult<DesyncReport> {
        let head_index = self.snapshot().head_index();
        let cutoff = now.saturating_sub(self.config.staleness_window_secs);
        let stale = self.ingest.stale_pending(head_index, cutoff)?;

        let inputs = DesyncInputs {
            now,
            head_index,
            max_known_index: self.ingest.max_known_index(),
            stale_pending: stale.len(),
            lowest_stale_index: stale.iter().map(|r| r.event.block_index).min(),
            max_index_gap: self.config.max_index_gap,
            staleness_window_secs: self.config.staleness_window_secs,
        };
        let report = evaluate_desync(inputs, &mut self.state.gap_tracker.lock());

        if report.desynced {
            if self
                .state
                .transition(EngineStatus::Running, EngineStatus::Desynced)
            {
                warn!(
                    head_index,
                    max_known_index = ?report.max_known_index,
                    cause = ?report.cause,
                    "[pl-03] ⚠️ Engine desynced from ingest log"
                );
            }
        } else if self
            .state
            .transition(EngineStatus::Desynced, EngineStatus::Running)
        {
            info!(head_index, "[pl-03] Engine back in sync");
        }

        self.state.record_desync(report.clone());
        Ok(report)
    }

    fn begin_recovery(&self) {
        let previous = self.state.set_status(EngineStatus::Recovering);
        info!(from = %previous, "[pl-03] 🔄 Recovery started");
    }
}
