//! # Error Types
//!
//! Errors for the ingest log and its storage backend.

use thiserror::Error;

/// Key-value backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl From<std::io::Error> for KVStoreError {
    fn from(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

/// Ingest log errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// An event with this id is already in the log.
    #[error("Duplicate event: {event_id}")]
    DuplicateEvent { event_id: String },

    /// No event with this id.
    #[error("Event not found: {event_id}")]
    NotFound { event_id: String },

    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] KVStoreError),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<bincode::Error> for IngestError {
    fn from(err: bincode::Error) -> Self {
        IngestError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;
