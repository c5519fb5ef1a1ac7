//! Tower middleware applied to every route.

pub mod tracing;

pub use self::tracing::TracingLayer;
