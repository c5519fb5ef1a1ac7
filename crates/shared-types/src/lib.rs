//! # Shared Types Crate
//!
//! This crate contains the domain entities exchanged between the ledger
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `BlockEvent` and `Block` are defined here and
//!   nowhere else.
//! - **Stable Signing Encoding**: the bytes a submitter signs are produced by
//!   [`encoding::signing_message`]; that function is versioned and frozen.
//! - **Injectable Time**: every component that reasons about wall-clock age
//!   takes a [`TimeSource`] so tests can drive time by hand.

pub mod encoding;
pub mod entities;
pub mod errors;
pub mod health;
pub mod time;

pub use encoding::{signing_message, SIGNING_DOMAIN_TAG};
pub use entities::*;
pub use errors::*;
pub use health::{LoopHeartbeat, ServiceHealth, ServiceProbe, ServiceStatus};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
