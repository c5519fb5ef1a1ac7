//! Route table and shared handler state.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use pl_01_signature_verification::SignatureVerificationApi;
use pl_02_ingest_store::IngestStore;
use pl_05_health_supervisor::HealthSupervisor;
use std::sync::Arc;

use crate::domain::ApiConfig;
use crate::handlers::{events, health, metrics};
use crate::middleware::TracingLayer;

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestStore>,
    pub verifier: Arc<dyn SignatureVerificationApi>,
    /// Also the way to the consensus engine.
    pub supervisor: Arc<HealthSupervisor>,
}

/// Build the HTTP router.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/events", post(events::submit_event))
        .route("/events/:event_id", get(events::get_event))
        .route("/health/status", get(health::status))
        .route("/health/consensus", get(health::consensus))
        .route("/health/consensus/restart", post(health::restart_consensus))
        .route("/health/blockchain", get(health::blockchain))
        .route("/health/services", get(health::services))
        .route("/metrics", get(metrics::metrics))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TracingLayer::new())
        .with_state(state)
}
