//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::errors::SignatureError;
use shared_types::BlockEvent;

/// Primary Signature Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`); the gateway and the
/// consensus engine hold the same instance behind an `Arc`.
pub trait SignatureVerificationApi: Send + Sync {
    /// Verify an Ed25519 signature over raw bytes.
    ///
    /// # Security
    /// - Length and charset are checked before any hex decoding
    /// - Every malformed input yields `false`
    fn verify(&self, public_key: &str, signature: &str, message: &[u8]) -> bool;

    /// Shape check only. No cryptography.
    fn check_format(&self, public_key: &str, signature: &str) -> Result<(), SignatureError>;

    /// Verify the signature carried by `event` over its canonical encoding.
    fn verify_event(&self, event: &BlockEvent) -> Result<(), SignatureError>;
}
