//! Chain repositories.

pub mod file;
pub mod memory;

pub use file::FileChainRepository;
pub use memory::InMemoryChainRepository;
