//! # Node Runtime Library
//!
//! Wiring for a Proof-Ledger node. The `node-runtime` binary is a thin
//! wrapper; everything here is exposed so tests can run whole nodes.
//!
//! - `container/`: configuration and subsystem construction
//! - `runtime`: task lifecycle

pub mod container;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use runtime::NodeRuntime;
