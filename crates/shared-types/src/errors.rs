//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Structural problems with a submitted event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A required text field is empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but out of range.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
