//! # Test Fixtures
//!
//! Signed events and fully wired in-process nodes. A [`TestNode`] owns the
//! same subsystems as a running node; only the backends (in-memory ingest,
//! in-memory chain, channel transport, manual clock) differ.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::Value;
use tower::ServiceExt;

use pl_01_signature_verification::SignatureVerificationService;
use pl_02_ingest_store::IngestStore;
use pl_03_consensus::{
    ChainStateRepository, ConsensusApi, ConsensusConfig, ConsensusDependencies, ConsensusEngine,
    InMemoryChainRepository,
};
use pl_04_gossip::{GossipConfig, GossipDependencies, GossipService, InMemoryHub};
use pl_05_health_supervisor::{HealthSupervisor, SupervisorConfig};
use pl_06_api_gateway::{build_router, ApiConfig, AppState, SubmitEventRequest};
use shared_types::{signing_message, BlockEvent, Capacity, ManualTimeSource, ServiceProbe};

/// Clock start for every fixture.
pub const START: u64 = 1_700_000_000;

// =============================================================================
// SIGNED EVENTS
// =============================================================================

/// A keypair that signs block events.
pub struct Submitter {
    key: SigningKey,
    miner_address: String,
}

impl Submitter {
    pub fn new(miner_address: &str) -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
            miner_address: miner_address.to_string(),
        }
    }

    pub fn event(&self, event_id: &str, block_index: u64, work_score: f64) -> BlockEvent {
        let mut event = BlockEvent {
            event_id: event_id.to_string(),
            block_index,
            block_hash: format!("{:064x}", block_index),
            content_id: format!("bafy-{}", event_id),
            miner_address: self.miner_address.clone(),
            capacity: Capacity::Laptop,
            work_score,
            timestamp: START as i64 + block_index as i64,
            signature: String::new(),
            public_key: hex::encode(self.key.verifying_key().to_bytes()),
        };
        event.signature = hex::encode(self.key.sign(&signing_message(&event)).to_bytes());
        event
    }
}

// =============================================================================
// IN-PROCESS NODES
// =============================================================================

/// Knobs for [`TestNode::spawn`].
pub struct NodeOptions {
    pub consensus: ConsensusConfig,
    pub supervisor: SupervisorConfig,
    pub gossip: GossipConfig,
    pub peers: Vec<String>,
    pub repository: Arc<dyn ChainStateRepository>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            consensus: ConsensusConfig::default(),
            supervisor: SupervisorConfig::default(),
            gossip: GossipConfig::default(),
            peers: Vec::new(),
            repository: Arc::new(InMemoryChainRepository::new()),
        }
    }
}

impl NodeOptions {
    pub fn with_peers(peers: &[&str]) -> Self {
        Self {
            peers: peers.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// One node: ingest log, engine, supervisor, gossip and HTTP router.
pub struct TestNode {
    pub address: String,
    pub ingest: Arc<IngestStore>,
    pub engine: Arc<ConsensusEngine>,
    pub supervisor: Arc<HealthSupervisor>,
    pub gossip: Arc<GossipService>,
    pub router: Router,
}

impl TestNode {
    /// Wire a node onto `hub`, using an in-memory ingest log.
    pub fn spawn(
        hub: &Arc<InMemoryHub>,
        clock: &Arc<ManualTimeSource>,
        address: &str,
        options: NodeOptions,
    ) -> Self {
        let ingest = Arc::new(IngestStore::in_memory_with_time_source(clock.clone()));
        Self::spawn_with_ingest(hub, clock, address, ingest, options)
    }

    pub fn spawn_with_ingest(
        hub: &Arc<InMemoryHub>,
        clock: &Arc<ManualTimeSource>,
        address: &str,
        ingest: Arc<IngestStore>,
        options: NodeOptions,
    ) -> Self {
        let verifier = Arc::new(SignatureVerificationService::new());
        let engine = Arc::new(ConsensusEngine::new(ConsensusDependencies {
            ingest: ingest.clone(),
            verifier: verifier.clone(),
            repository: options.repository,
            time_source: clock.clone(),
            config: options.consensus,
        }));

        let (transport, inbound) = hub.join(address, options.gossip.inbound_capacity);
        let gossip = Arc::new(GossipService::new(GossipDependencies {
            ingest: ingest.clone(),
            transport: Arc::new(transport),
            inbound,
            time_source: clock.clone(),
            config: options.gossip,
            local_address: address.to_string(),
            bootstrap_peers: options.peers,
        }));

        let supervisor = Arc::new(HealthSupervisor::new(
            engine.clone(),
            options.supervisor,
            clock.clone(),
        ));
        supervisor.register_probe(gossip.clone() as Arc<dyn ServiceProbe>);

        let router = build_router(
            AppState {
                ingest: ingest.clone(),
                verifier,
                supervisor: supervisor.clone(),
            },
            &ApiConfig::default(),
        );

        Self {
            address: address.to_string(),
            ingest,
            engine,
            supervisor,
            gossip,
            router,
        }
    }

    /// Process pending events until the engine is idle. Returns how many
    /// steps did work.
    pub fn drain(&self) -> usize {
        let mut steps = 0;
        while let Ok(outcome) = self.engine.process_next() {
            if outcome.is_idle() {
                break;
            }
            steps += 1;
        }
        steps
    }

    pub fn head_index(&self) -> u64 {
        self.engine.snapshot().head_index()
    }

    /// `POST /events` with `event` as the body.
    pub async fn submit(&self, event: &BlockEvent) -> (StatusCode, Value) {
        let body = serde_json::to_value(SubmitEventRequest::from(event.clone()))
            .unwrap_or(Value::Null);
        self.request(Method::POST, "/events", Some(body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::POST, uri, None).await
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            return (StatusCode::BAD_REQUEST, Value::Null);
        };

        let Ok(response) = self.router.clone().oneshot(request).await else {
            return (StatusCode::INTERNAL_SERVER_ERROR, Value::Null);
        };
        let status = response.status();
        let json = match to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };
        (status, json)
    }
}

/// One full exchange: every node broadcasts, then every node listens.
pub async fn gossip_round(nodes: &[&TestNode]) {
    for node in nodes {
        node.gossip.broadcast_once().await;
    }
    for node in nodes {
        node.gossip.listen_once();
    }
}
