//! # Ingest Store Subsystem (PL-02)
//!
//! Durable, append-only log of submitted `BlockEvent`s.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): stored records, status, in-memory indices
//! - **Ports Layer** (`ports/`): `KeyValueStore` backend abstraction
//! - **Adapters** (`adapters/`): in-memory and file-backed stores
//! - **Service Layer** (`service/`): `IngestStore`, the public API
//!
//! ## Invariants
//!
//! - `event_id` is unique; a second `append` with the same id changes nothing.
//! - Events are never rewritten. Only their status moves, once, from
//!   `Pending` to `Accepted` or `Rejected`.
//! - Every append receives a strictly increasing ingest sequence.
//!
//! Signatures are not checked here. Validation belongs to the consumer.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::entities::{EventStatus, IngestStats, StoredEvent};
pub use domain::errors::{IngestError, IngestResult, KVStoreError};
pub use ports::outbound::{KeyValueStore, ScanResult};
pub use service::{IngestStore, Unprocessed};
