//! # API Gateway Subsystem (PL-06)
//!
//! HTTP surface of a node, built on `axum`.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/events` | Submit a signed block event (`202`, `400`, `409`) |
//! | `GET` | `/events/{event_id}` | Stored status of one event |
//! | `GET` | `/health/status` | `{active, chain_head_index, desynced}` |
//! | `GET` | `/health/consensus` | Engine state machine and supervisor snapshot |
//! | `GET` | `/health/blockchain` | Chain length, head hash, cumulative work |
//! | `GET` | `/health/services` | Liveness of the engine loop and gossip loops |
//! | `POST` | `/health/consensus/restart` | Bounded manual restart (`429` when spent) |
//! | `GET` | `/metrics` | Prometheus text |
//!
//! The gateway holds no state of its own. It writes only to the ingest log
//! and reads everything else through the health supervisor.

pub mod domain;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{ApiConfig, ApiError, ApiResult, ErrorBody, SubmitEventRequest};
pub use router::{build_router, AppState};
pub use service::ApiGateway;
