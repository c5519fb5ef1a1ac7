//! API error type and its HTTP mapping.
//!
//! Every failure leaves the gateway as `{"error": <code>, "reason": <text>}`
//! with the status code below.
//!
//! | Error | Status |
//! |-------|--------|
//! | `InvalidFormat`, `InvalidSignature` | 400 |
//! | `NotFound` | 404 |
//! | `DuplicateEvent` | 409 |
//! | `RestartBudgetExceeded` | 429 |
//! | `Unavailable` | 503 |
//! | `Internal` | 500 |

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pl_01_signature_verification::SignatureError;
use pl_02_ingest_store::IngestError;
use pl_05_health_supervisor::SupervisorError;
use serde::{Deserialize, Serialize};
use shared_types::FormatError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Wire form of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not a well-formed submission.
    #[error("{reason}")]
    InvalidFormat { reason: String },

    /// Well-formed but the signature does not verify.
    #[error("{reason}")]
    InvalidSignature { reason: String },

    #[error("event {event_id} already submitted")]
    DuplicateEvent { event_id: String },

    #[error("event {event_id} not found")]
    NotFound { event_id: String },

    #[error("restart budget of {budget} per {window_secs}s exhausted")]
    RestartBudgetExceeded { budget: usize, window_secs: u64 },

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable code, also the `reason` metric label for refusals.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidFormat { .. } => "invalid_format",
            ApiError::InvalidSignature { .. } => "invalid_signature",
            ApiError::DuplicateEvent { .. } => "duplicate_event",
            ApiError::NotFound { .. } => "not_found",
            ApiError::RestartBudgetExceeded { .. } => "restart_budget_exceeded",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFormat { .. } | ApiError::InvalidSignature { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DuplicateEvent { .. } => StatusCode::CONFLICT,
            ApiError::RestartBudgetExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code().to_string(),
            reason: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidFormat {
            reason: rejection.body_text(),
        }
    }
}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        ApiError::InvalidFormat {
            reason: err.to_string(),
        }
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        if err.is_format_error() {
            ApiError::InvalidFormat {
                reason: err.to_string(),
            }
        } else {
            ApiError::InvalidSignature {
                reason: err.to_string(),
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::DuplicateEvent { event_id } => ApiError::DuplicateEvent { event_id },
            IngestError::NotFound { event_id } => ApiError::NotFound { event_id },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SupervisorError> for ApiError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::RestartBudgetExceeded {
                budget,
                window_secs,
            } => ApiError::RestartBudgetExceeded {
                budget,
                window_secs,
            },
            SupervisorError::Consensus(e) => ApiError::Unavailable(e.to_string()),
        }
    }
}
