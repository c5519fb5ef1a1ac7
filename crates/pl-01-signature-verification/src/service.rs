//! # Signature Verification Service
//!
//! Application service layer that implements the `SignatureVerificationApi` trait.
//!
//! Delegates cryptographic operations to the domain layer and keeps running
//! counters that the health endpoints surface.

use crate::domain::ed25519;
use crate::domain::errors::SignatureError;
use crate::ports::inbound::SignatureVerificationApi;
use shared_types::BlockEvent;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationStats {
    pub verified: u64,
    pub rejected_format: u64,
    pub rejected_signature: u64,
}

/// Signature Verification Service.
///
/// Stateless apart from counters, so one instance is shared by every caller.
#[derive(Debug, Default)]
pub struct SignatureVerificationService {
    verified: AtomicU64,
    rejected_format: AtomicU64,
    rejected_signature: AtomicU64,
}

impl SignatureVerificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> VerificationStats {
        VerificationStats {
            verified: self.verified.load(Ordering::Relaxed),
            rejected_format: self.rejected_format.load(Ordering::Relaxed),
            rejected_signature: self.rejected_signature.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &Result<(), SignatureError>) {
        let counter = match result {
            Ok(()) => &self.verified,
            Err(e) if e.is_format_error() => &self.rejected_format,
            Err(_) => &self.rejected_signature,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl SignatureVerificationApi for SignatureVerificationService {
    fn verify(&self, public_key: &str, signature: &str, message: &[u8]) -> bool {
        let result = ed25519::verify_detailed(public_key, signature, message);
        self.record(&result);
        result.is_ok()
    }

    fn check_format(&self, public_key: &str, signature: &str) -> Result<(), SignatureError> {
        ed25519::check_format(public_key, signature)
    }

    fn verify_event(&self, event: &BlockEvent) -> Result<(), SignatureError> {
        let result = ed25519::verify_event(event);
        self.record(&result);
        result
    }
}
