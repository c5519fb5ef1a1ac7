//! # Node Runtime
//!
//! Starts the long-running tasks of a node and stops them together.
//!
//! ## Startup Sequence
//!
//! 1. Bootstrap the consensus engine and spawn its loop (via the supervisor)
//! 2. Start the gossip listener and the three gossip loops
//! 3. Start the supervisor poll loop
//! 4. Start the HTTP server
//!
//! ## Shutdown Sequence
//!
//! One `watch` channel reaches every task. Tasks get a grace period to
//! finish before the runtime stops waiting for them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{NodeConfig, SubsystemContainer};

/// How long shutdown waits for tasks before giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The main node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    container: SubsystemContainer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Build every subsystem. Nothing runs until [`start`](Self::start).
    pub async fn new(config: NodeConfig) -> Result<Self> {
        let container = SubsystemContainer::new(config).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    pub fn container(&self) -> &SubsystemContainer {
        &self.container
    }

    /// Start every background task.
    pub fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  Proof-Ledger Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let report = self
            .container
            .supervisor
            .start()
            .context("bootstrapping consensus engine")?;
        info!(
            head_index = report.head_index,
            loaded_from_disk = report.loaded_from_disk,
            reconciled = report.reconciled,
            "Chain ready"
        );

        if let Some(acceptor) = self.container.gossip_acceptor.take() {
            let inbox = self.container.gossip_inbox.clone();
            let shutdown = self.shutdown_rx.clone();
            self.tasks
                .push(tokio::spawn(acceptor.serve(inbox, shutdown)));
        }
        self.tasks
            .extend(self.container.gossip.spawn(self.shutdown_rx.clone()));

        let supervisor = Arc::clone(&self.container.supervisor);
        self.tasks
            .push(tokio::spawn(supervisor.run(self.shutdown_rx.clone())));

        if let (Some(gateway), Some(listener)) = (
            self.container.gateway.take(),
            self.container.http_listener.take(),
        ) {
            let shutdown = self.shutdown_rx.clone();
            self.tasks.push(tokio::spawn(async move {
                if let Err(e) = gateway.serve(listener, shutdown).await {
                    error!("[pl-06] HTTP server failed: {}", e);
                }
            }));
        }

        info!(
            gossip = %self.container.config.network.advertised(),
            http_port = self.container.config.api.port,
            data_dir = %self.container.config.storage.data_dir.display(),
            "All subsystems running"
        );
        Ok(())
    }

    /// Signal every task and wait for them, up to the grace period.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }

        let tasks = std::mem::take(&mut self.tasks);
        let waited = tokio::time::timeout(SHUTDOWN_GRACE, futures::future::join_all(tasks)).await;
        match waited {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        error!("Task ended abnormally: {}", e);
                    }
                }
            }
            Err(_) => warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Tasks still running after grace period"
            ),
        }

        // The supervisor stops the engine loop on its way out; this covers
        // the case where it never started.
        self.container.supervisor.stop().await;
        info!("Shutdown complete");
    }
}
