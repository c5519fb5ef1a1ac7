//! Domain layer for the ingest log.

pub mod entities;
pub mod errors;
pub mod index;
