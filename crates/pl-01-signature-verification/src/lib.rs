//! # Signature Verification Subsystem (PL-01)
//!
//! Validates the authenticity of submitted block events.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): Trait definitions for the inbound interface
//! - **Service Layer** (`service.rs`): Wires domain logic to ports
//!
//! ## Security Notes
//!
//! - **Guard Before Decode**: hex inputs pass a length and charset check
//!   before any decoding is attempted; malformed input is a `false`, never a
//!   panic.
//! - **Zero-Trust**: the API gateway verifies on submission and the consensus
//!   engine verifies again before folding an event into the chain.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::ed25519::{check_format, verify, verify_detailed, verify_event};
pub use domain::errors::SignatureError;
pub use ports::inbound::SignatureVerificationApi;
pub use service::{SignatureVerificationService, VerificationStats};
