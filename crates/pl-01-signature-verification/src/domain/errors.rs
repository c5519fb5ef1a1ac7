//! # Signature Errors
//!
//! Error types for signature verification operations.

use thiserror::Error;

/// Errors that can occur during signature verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Wrong length or a character outside `[0-9a-fA-F]`.
    #[error("Invalid {field} format: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    /// The 32 key bytes do not decode to a curve point.
    #[error("Public key is not a valid Ed25519 point")]
    InvalidPublicKey,

    /// Signature verification failed (signature doesn't match message/signer)
    #[error("Signature verification failed")]
    VerificationFailed,
}

impl SignatureError {
    /// True for problems detectable without any cryptography.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            SignatureError::InvalidFormat { .. } | SignatureError::InvalidPublicKey
        )
    }
}
