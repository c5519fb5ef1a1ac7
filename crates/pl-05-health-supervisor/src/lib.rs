//! # Health Supervisor Subsystem (PL-05)
//!
//! In-process supervisor for the consensus engine.
//!
//! - polls `check_desync` on a fixed interval and publishes a
//!   [`HealthSnapshot`]
//! - restarts the engine after consecutive desynced polls, within a
//!   sliding-window budget
//! - reports liveness of the engine loop and any registered
//!   [`ServiceProbe`](shared_types::ServiceProbe)
//!
//! The supervisor never writes chain state. Restarts reload it from the
//! repository through the engine's own `bootstrap`.

pub mod domain;
pub mod metrics;
pub mod service;

pub use domain::{
    HealthSnapshot, RestartBudget, RestartTrigger, SupervisorConfig, SupervisorError,
    SupervisorResult,
};
pub use service::HealthSupervisor;
