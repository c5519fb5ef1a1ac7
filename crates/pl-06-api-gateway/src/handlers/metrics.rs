//! Prometheus scrape endpoint.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::domain::ApiError;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// `GET /metrics`
pub async fn metrics() -> Response {
    match ledger_telemetry::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            text,
        )
            .into_response(),
        Err(e) => ApiError::Internal(e.to_string()).into_response(),
    }
}
