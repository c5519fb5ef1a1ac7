//! Supervisor domain: configuration, restart budget, snapshot, errors.

pub mod budget;
pub mod config;
pub mod errors;
pub mod snapshot;

pub use budget::RestartBudget;
pub use config::SupervisorConfig;
pub use errors::{SupervisorError, SupervisorResult};
pub use snapshot::{HealthSnapshot, RestartTrigger};
