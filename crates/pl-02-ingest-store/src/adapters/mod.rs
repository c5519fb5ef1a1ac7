//! Storage backends for the ingest log.
//!
//! - `memory`: `InMemoryKVStore`, tests and ephemeral nodes
//! - `file`: `FileBackedKVStore`, single-file durable store

pub mod file;
pub mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
