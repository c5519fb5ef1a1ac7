//! Transport adapters.

pub mod memory;
pub mod tcp;

pub use memory::{InMemoryHub, InMemoryTransport};
pub use tcp::{TcpAcceptor, TcpTransport};
