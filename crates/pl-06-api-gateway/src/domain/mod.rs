//! Domain types for the API gateway.

pub mod config;
pub mod error;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorBody};
pub use types::*;
