//! # Health Supervisor
//!
//! Owns the consensus engine's processing loop. Polls the engine on a fixed
//! interval and restarts it when it stays desynced.
//!
//! ## Restart path
//!
//! 1. stop the processing loop and wait for it to exit
//! 2. `begin_recovery()` then `bootstrap()` (reload chain, reconcile log)
//! 3. spawn a fresh processing loop
//!
//! Restarts are capped by a sliding-window budget. Running out is fatal:
//! automatic recovery stops until an operator restart succeeds.


use crate::domain::{
    HealthSnapshot, RestartBudget, RestartTrigger, SupervisorConfig, SupervisorError,
    SupervisorResult,
};
use crate::metrics;
use parking_lot::{Mutex, RwLock};
use pl_03_consensus::{BootstrapReport, ConsensusApi, ConsensusEngine, EngineStatus};
use shared_types::{LoopHeartbeat, ServiceHealth, ServiceProbe, ServiceStatus, TimeSource};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

struct EngineLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct SupervisorState {
    budget: RestartBudget,
    consecutive_desync_polls: u32,
    last_desync_detected: bool,
    last_restart_at: Option<u64>,
    fatal: bool,
}

/// Supervises the consensus engine.
pub struct HealthSupervisor {
    engine: Arc<ConsensusEngine>,
    config: SupervisorConfig,
    time_source: Arc<dyn TimeSource>,
    probes: RwLock<Vec<Arc<dyn ServiceProbe>>>,
    state: Mutex<SupervisorState>,
    engine_loop: Mutex<Option<EngineLoop>>,
    restart_lock: tokio::sync::Mutex<()>,
    heartbeat: LoopHeartbeat,
}

impl HealthSupervisor {
    pub fn new(
        engine: Arc<ConsensusEngine>,
        config: SupervisorConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let budget = RestartBudget::new(config.restart_budget, config.restart_window_secs);
        Self {
            engine,
            config,
            time_source,
            probes: RwLock::new(Vec::new()),
            state: Mutex::new(SupervisorState {
                budget,
                consecutive_desync_polls: 0,
                last_desync_detected: false,
                last_restart_at: None,
                fatal: false,
            }),
            engine_loop: Mutex::new(None),
            restart_lock: tokio::sync::Mutex::new(()),
            heartbeat: LoopHeartbeat::new(),
        }
    }

    pub fn engine(&self) -> &Arc<ConsensusEngine> {
        &self.engine
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Report the liveness of another service through `services()`.
    pub fn register_probe(&self, probe: Arc<dyn ServiceProbe>) {
        self.probes.write().push(probe);
    }

    pub fn is_fatal(&self) -> bool {
        self.state.lock().fatal
    }

    // =========================================================================
    // ENGINE LIFECYCLE
    // =========================================================================

    /// Bootstrap the engine and spawn its processing loop.
    pub fn start(&self) -> SupervisorResult<BootstrapReport> {
        let report = self.engine.bootstrap()?;
        info!(
            head_index = report.head_index,
            loaded_from_disk = report.loaded_from_disk,
            "[pl-05] 🚀 Consensus engine started"
        );
        self.spawn_engine_loop();
        Ok(report)
    }

    /// Stop the processing loop and wait for it to exit.
    pub async fn stop(&self) {
        self.stop_engine_loop().await;
    }

    pub fn is_engine_loop_running(&self) -> bool {
        self.engine_loop
            .lock()
            .as_ref()
            .is_some_and(|l| !l.handle.is_finished())
    }

    fn spawn_engine_loop(&self) {
        let mut slot = self.engine_loop.lock();
        if slot.as_ref().is_some_and(|l| !l.handle.is_finished()) {
            return;
        }
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&self.engine).run(rx));
        *slot = Some(EngineLoop { shutdown, handle });
    }

    async fn stop_engine_loop(&self) {
        let taken = self.engine_loop.lock().take();
        let Some(engine_loop) = taken else {
            return;
        };
        // The loop also exits if the sender is gone, so a failed send is fine.
        let _ = engine_loop.shutdown.send(true);
        if let Err(e) = engine_loop.handle.await {
            error!("[pl-05] engine loop ended abnormally: {}", e);
        }
    }

    // =========================================================================
    // POLLING
    // =========================================================================

    /// One health poll. Restarts the engine if it has been desynced for
    /// `desync_polls_before_restart` polls in a row.
    pub async fn poll_once(&self) -> SupervisorResult<HealthSnapshot> {
        let now = self.time_source.now();
        let report = self.engine.check_desync(now)?;
        self.heartbeat.beat(now);
        metrics::record_desync(report.desynced);

        let (should_restart, consecutive) = {
            let mut state = self.state.lock();
            state.last_desync_detected = report.desynced;
            if report.desynced {
                state.consecutive_desync_polls += 1;
            } else {
                state.consecutive_desync_polls = 0;
            }
            (
                report.desynced
                    && !state.fatal
                    && state.consecutive_desync_polls >= self.config.desync_polls_before_restart,
                state.consecutive_desync_polls,
            )
        };

        if report.desynced {
            warn!(
                consecutive,
                head_index = report.head_index,
                max_known_index = ?report.max_known_index,
                "[pl-05] ⚠️ Desync detected"
            );
        }

        if should_restart {
            match self.restart(RestartTrigger::Desync).await {
                Ok(_) | Err(SupervisorError::RestartBudgetExceeded { .. }) => {}
                Err(e) => error!("[pl-05] ❌ Restart failed: {}", e),
            }
        }

        Ok(self.build_snapshot(now))
    }

    /// Operator-requested restart. Uses the same budget as automatic ones;
    /// a successful manual restart clears the fatal flag.
    pub async fn force_restart(&self) -> SupervisorResult<BootstrapReport> {
        self.restart(RestartTrigger::Manual).await
    }

    async fn restart(&self, trigger: RestartTrigger) -> SupervisorResult<BootstrapReport> {
        let _serial = self.restart_lock.lock().await;
        let now = self.time_source.now();

        {
            let mut state = self.state.lock();
            let allowed = !(trigger == RestartTrigger::Desync && state.fatal)
                && state.budget.try_consume(now);
            if !allowed {
                if !state.fatal {
                    state.fatal = true;
                    metrics::record_fatal(true);
                    error!(
                        budget = state.budget.max_restarts(),
                        window_secs = state.budget.window_secs(),
                        "[pl-05] 💀 Restart budget exhausted, automatic recovery stopped"
                    );
                }
                return Err(SupervisorError::RestartBudgetExceeded {
                    budget: state.budget.max_restarts(),
                    window_secs: state.budget.window_secs(),
                });
            }
            state.consecutive_desync_polls = 0;
            state.last_restart_at = Some(now);
        }

        warn!(trigger = trigger.as_str(), "[pl-05] 🔄 Restarting consensus engine");
        metrics::record_restart(trigger.as_str());

        self.stop_engine_loop().await;
        self.engine.begin_recovery();
        let bootstrapped = self.engine.bootstrap();
        // Respawn even on failure; a recovering engine idles until the next
        // successful bootstrap.
        self.spawn_engine_loop();
        let report = bootstrapped?;

        if trigger == RestartTrigger::Manual {
            let mut state = self.state.lock();
            if state.fatal {
                state.fatal = false;
                metrics::record_fatal(false);
                info!("[pl-05] Fatal state cleared by operator restart");
            }
        }

        info!(
            trigger = trigger.as_str(),
            head_index = report.head_index,
            reconciled = report.reconciled,
            "[pl-05] ✅ Consensus engine restarted"
        );
        Ok(report)
    }

    /// Poll until `shutdown` turns `true`, then stop the engine loop.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.heartbeat.mark_started();
        info!(poll_ms = period.as_millis() as u64, "[pl-05] 🩺 Health supervisor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        error!("[pl-05] health poll failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.stop_engine_loop().await;
        self.heartbeat.mark_stopped();
        info!("[pl-05] Health supervisor stopped");
    }

    // =========================================================================
    // READ-ONLY VIEWS
    // =========================================================================

    /// Current health without polling. Never changes engine state.
    pub fn snapshot(&self) -> HealthSnapshot {
        self.build_snapshot(self.time_source.now())
    }

    fn build_snapshot(&self, now: u64) -> HealthSnapshot {
        let chain = self.engine.snapshot();
        let ingest_store_max_index = self.engine.ingest().max_known_index();
        let engine_status = self.engine.status();

        let mut state = self.state.lock();
        HealthSnapshot {
            checked_at: now,
            chain_head_index: chain.head_index(),
            ingest_store_max_index,
            desync_detected: state.last_desync_detected,
            last_restart_at: state.last_restart_at,
            restart_count: state.budget.used(now),
            consecutive_desync_polls: state.consecutive_desync_polls,
            fatal: state.fatal,
            engine_status,
        }
    }

    /// Liveness of the engine loop, this supervisor and every registered
    /// probe, in that order.
    pub fn services(&self) -> Vec<ServiceHealth> {
        let mut services = vec![self.engine_health(), self.health()];
        services.extend(self.probes.read().iter().map(|p| p.health()));
        services
    }

    fn engine_health(&self) -> ServiceHealth {
        let engine_status = self.engine.status();
        let status = if !self.is_engine_loop_running() {
            ServiceStatus::Stopped
        } else if engine_status == EngineStatus::Running {
            ServiceStatus::Running
        } else {
            ServiceStatus::Degraded
        };

        ServiceHealth {
            name: "consensus".to_string(),
            status,
            last_activity: self.engine.status_report().bootstrapped_at,
            detail: Some(engine_status.as_str().to_string()),
        }
    }
}

impl ServiceProbe for HealthSupervisor {
    fn name(&self) -> &str {
        "health-supervisor"
    }

    fn health(&self) -> ServiceHealth {
        let fatal = self.is_fatal();
        let status = match (self.heartbeat.status(), fatal) {
            (ServiceStatus::Running, true) => ServiceStatus::Degraded,
            (status, _) => status,
        };
        ServiceHealth {
            name: self.name().to_string(),
            status,
            last_activity: self.heartbeat.last_tick(),
            detail: fatal.then(|| "restart budget exhausted".to_string()),
        }
    }
}
