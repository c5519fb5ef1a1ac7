//! Ports layer.

pub mod inbound;
pub mod outbound;

pub use inbound::ConsensusApi;
pub use outbound::ChainStateRepository;
