//! # Ed25519 Verification
//!
//! Pure domain logic for verifying block event signatures.
//!
//! ## Security Notes
//!
//! - **Guard Before Decode**: `public_key` must be exactly 64 hex chars and
//!   `signature` exactly 128. Length is checked first, then charset, and only
//!   then is anything decoded. A decoding fault at this boundary once froze
//!   the chain at a fixed height; here it is a typed error.
//! - **Pure**: no I/O, no state, safe to call from any task.

use super::errors::SignatureError;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use shared_types::{signing_message, BlockEvent, PUBLIC_KEY_HEX_LEN, SIGNATURE_HEX_LEN};
use tracing::debug;

// =============================================================================
// FORMAT GUARDS
// =============================================================================

/// Check that a hex field has the exact length and only hex digits.
fn check_hex(field: &'static str, value: &str, expected_len: usize) -> Result<(), SignatureError> {
    if value.len() != expected_len {
        return Err(SignatureError::InvalidFormat {
            field,
            reason: format!("expected {} hex chars, got {}", expected_len, value.len()),
        });
    }

    if let Some(pos) = value.bytes().position(|b| !b.is_ascii_hexdigit()) {
        return Err(SignatureError::InvalidFormat {
            field,
            reason: format!("non-hex character at position {}", pos),
        });
    }

    Ok(())
}

/// Validate the hex shape of a key/signature pair without decoding either.
pub fn check_format(public_key: &str, signature: &str) -> Result<(), SignatureError> {
    check_hex("public_key", public_key, PUBLIC_KEY_HEX_LEN)?;
    check_hex("signature", signature, SIGNATURE_HEX_LEN)?;
    Ok(())
}

// =============================================================================
// DECODING (only reachable after the guards pass)
// =============================================================================

fn decode_public_key(public_key: &str) -> Result<VerifyingKey, SignatureError> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(public_key, &mut bytes).map_err(|e| SignatureError::InvalidFormat {
        field: "public_key",
        reason: e.to_string(),
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidPublicKey)
}

fn decode_signature(signature: &str) -> Result<Signature, SignatureError> {
    let mut bytes = [0u8; 64];
    hex::decode_to_slice(signature, &mut bytes).map_err(|e| SignatureError::InvalidFormat {
        field: "signature",
        reason: e.to_string(),
    })?;
    Ok(Signature::from_bytes(&bytes))
}

// =============================================================================
// CORE VERIFICATION FUNCTIONS
// =============================================================================

/// Verify with a typed failure.
pub fn verify_detailed(
    public_key: &str,
    signature: &str,
    message: &[u8],
) -> Result<(), SignatureError> {
    check_format(public_key, signature)?;

    let key = decode_public_key(public_key)?;
    let sig = decode_signature(signature)?;

    key.verify(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Verify an Ed25519 signature over `message`.
///
/// Returns `false` for every malformed input; never panics.
pub fn verify(public_key: &str, signature: &str, message: &[u8]) -> bool {
    match verify_detailed(public_key, signature, message) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "[pl-01] signature rejected");
            false
        }
    }
}

/// Verify the signature carried by a block event over its canonical encoding.
pub fn verify_event(event: &BlockEvent) -> Result<(), SignatureError> {
    // Guard first so a malformed key never reaches the encoder either.
    check_format(&event.public_key, &event.signature)?;
    let message = signing_message(event);
    verify_detailed(&event.public_key, &event.signature, &message)
}

// =============================================================================
// TESTS
// =============================================================================
