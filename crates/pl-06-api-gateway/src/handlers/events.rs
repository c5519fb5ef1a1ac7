//! Event submission and lookup.
//!
//! Submissions are checked in the order format, signature, uniqueness. Only
//! an event that passes all three reaches the ingest log. Signatures are
//! checked again by the consensus engine.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shared_types::BlockEvent;
use tracing::{debug, info};

use crate::domain::{
    ApiError, ApiResult, EventStatusResponse, SubmitEventRequest, SubmitEventResponse,
};
use crate::metrics;
use crate::router::AppState;

/// `POST /events`
pub async fn submit_event(
    State(state): State<AppState>,
    body: Result<Json<SubmitEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitEventResponse>)> {
    match admit(&state, body) {
        Ok(response) => {
            metrics::record_accepted();
            Ok((StatusCode::ACCEPTED, Json(response)))
        }
        Err(err) => {
            metrics::record_refused(err.code());
            debug!(error = err.code(), reason = %err, "[pl-06] submission refused");
            Err(err)
        }
    }
}

fn admit(
    state: &AppState,
    body: Result<Json<SubmitEventRequest>, JsonRejection>,
) -> ApiResult<SubmitEventResponse> {
    let Json(request) = body?;
    let event = BlockEvent::from(request);

    event.validate_format()?;
    state.verifier.verify_event(&event)?;

    let event_id = event.event_id.clone();
    let block_index = event.block_index;
    let sequence = state.ingest.append(event)?;

    info!(
        event_id = %event_id,
        block_index,
        sequence,
        "[pl-06] 📥 Event accepted for processing"
    );

    Ok(SubmitEventResponse {
        event_id,
        status: "pending".to_string(),
        sequence,
    })
}

/// `GET /events/{event_id}`
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<EventStatusResponse>> {
    match state.ingest.get(&event_id)? {
        Some(stored) => Ok(Json(EventStatusResponse::from(stored))),
        None => Err(ApiError::NotFound { event_id }),
    }
}
