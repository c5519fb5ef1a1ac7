//! # Outbound Ports (Driven Ports)
//!
//! Backend the ingest log persists through.
//!
//! Production: `FileBackedKVStore`. Testing: `InMemoryKVStore`.

use crate::domain::errors::KVStoreError;

/// Key/value pairs returned by a prefix scan.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// All pairs whose key starts with `prefix`, ordered by key.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Human-readable location, for startup logs.
    fn describe(&self) -> String;
}

