//! # Subsystem Container
//!
//! Holds all subsystem instances of one node.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Signature Verification (stateless)
//! Level 1: Ingest Store (file-backed log)
//! Level 2: Consensus Engine (chain file, depends on 0-1)
//! Level 3: Gossip Network (depends on 1), Health Supervisor (depends on 2)
//! Level 4: API Gateway (depends on 0, 1, 3)
//! ```
//!
//! Listeners are bound here so port conflicts fail the build, not a
//! background task.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use pl_01_signature_verification::SignatureVerificationService;
use pl_02_ingest_store::{FileBackedKVStore, IngestStore};
use pl_03_consensus::{ConsensusDependencies, ConsensusEngine, FileChainRepository};
use pl_04_gossip::{GossipDependencies, GossipMessage, GossipService, TcpAcceptor, TcpTransport};
use pl_05_health_supervisor::HealthSupervisor;
use pl_06_api_gateway::{ApiGateway, AppState};
use shared_types::{ServiceProbe, SystemTimeSource, TimeSource};

use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    pub ingest: Arc<IngestStore>,
    pub engine: Arc<ConsensusEngine>,
    pub supervisor: Arc<HealthSupervisor>,
    pub gossip: Arc<GossipService>,
    /// Taken by the runtime when the node starts.
    pub gossip_acceptor: Option<TcpAcceptor>,
    pub gossip_inbox: mpsc::Sender<GossipMessage>,
    pub gateway: Option<ApiGateway>,
    pub http_listener: Option<TcpListener>,
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
}

impl SubsystemContainer {
    /// Create every subsystem and bind both listeners.
    #[instrument(name = "subsystem_init", skip(config))]
    pub async fn new(config: NodeConfig) -> Result<Self> {
        info!("Initializing Proof-Ledger subsystem container");
        let time_source: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

        std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!(
                "creating data directory {}",
                config.storage.data_dir.display()
            )
        })?;

        // =====================================================================
        // LEVEL 0-1: Signature Verification, Ingest Store
        // =====================================================================
        let verifier = Arc::new(SignatureVerificationService::new());
        info!("  [pl-01] Signature Verification initialized (stateless)");

        let ingest_path = config.storage.ingest_path();
        let kv = FileBackedKVStore::open(&ingest_path)
            .with_context(|| format!("opening ingest log {}", ingest_path.display()))?;
        let ingest = Arc::new(
            IngestStore::with_time_source(Box::new(kv), Arc::clone(&time_source))
                .context("indexing ingest log")?,
        );
        info!("  [pl-02] Ingest Store initialized ({})", ingest.describe());

        // =====================================================================
        // LEVEL 2: Consensus Engine
        // =====================================================================
        let engine = Arc::new(ConsensusEngine::new(ConsensusDependencies {
            ingest: Arc::clone(&ingest),
            verifier: verifier.clone(),
            repository: Arc::new(FileChainRepository::new(config.storage.chain_path())),
            time_source: Arc::clone(&time_source),
            config: config.consensus.clone(),
        }));
        info!(
            "  [pl-03] Consensus Engine initialized (chain at {})",
            config.storage.chain_path().display()
        );

        // =====================================================================
        // LEVEL 3: Gossip Network, Health Supervisor
        // =====================================================================
        let gossip_bind = config.network.gossip_bind();
        let gossip_acceptor = TcpAcceptor::bind(&gossip_bind, &config.gossip)
            .await
            .with_context(|| format!("binding gossip listener on {}", gossip_bind))?;
        let local_address = config.network.advertised();
        let (gossip_inbox, inbound) = mpsc::channel(config.gossip.inbound_capacity);
        let gossip = Arc::new(GossipService::new(GossipDependencies {
            ingest: Arc::clone(&ingest),
            transport: Arc::new(TcpTransport::new(
                local_address.clone(),
                config.gossip.max_frame_len,
            )),
            inbound,
            time_source: Arc::clone(&time_source),
            config: config.gossip.clone(),
            local_address,
            bootstrap_peers: config.network.peers.clone(),
        }));
        info!(
            "  [pl-04] Gossip Network initialized ({} bootstrap peers)",
            config.network.peers.len()
        );

        let supervisor = Arc::new(HealthSupervisor::new(
            Arc::clone(&engine),
            config.health.clone(),
            Arc::clone(&time_source),
        ));
        supervisor.register_probe(Arc::clone(&gossip) as Arc<dyn ServiceProbe>);
        info!("  [pl-05] Health Supervisor initialized");

        // =====================================================================
        // LEVEL 4: API Gateway
        // =====================================================================
        let gateway = ApiGateway::new(
            config.api.clone(),
            AppState {
                ingest: Arc::clone(&ingest),
                verifier,
                supervisor: Arc::clone(&supervisor),
            },
        );
        let http_listener = gateway
            .bind()
            .await
            .with_context(|| format!("binding HTTP listener on port {}", config.api.port))?;
        info!("  [pl-06] API Gateway initialized");

        Ok(Self {
            ingest,
            engine,
            supervisor,
            gossip,
            gossip_acceptor: Some(gossip_acceptor),
            gossip_inbox,
            gateway: Some(gateway),
            http_listener: Some(http_listener),
            config,
        })
    }

    /// Actual HTTP address, useful when the configured port is 0.
    pub fn http_addr(&self) -> Option<std::net::SocketAddr> {
        self.http_listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    /// Actual gossip address, useful when the configured port is 0.
    pub fn gossip_addr(&self) -> Option<std::net::SocketAddr> {
        self.gossip_acceptor
            .as_ref()
            .and_then(|acceptor| acceptor.local_addr().ok())
    }
}
