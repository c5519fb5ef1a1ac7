//! # Subsystem Container
//!
//! Builds every subsystem of a node in dependency order and holds the
//! shared handles.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::SubsystemContainer;
