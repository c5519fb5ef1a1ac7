//! # Proof-Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks
//! └── src/
//!     ├── fixtures.rs   # signed events and in-process nodes
//!     └── integration/  # cross-crate flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pl-tests
//! cargo test -p pl-tests integration::gossip_flow
//! cargo bench -p pl-tests
//! ```

pub mod fixtures;
pub mod integration;
