//! Health endpoints. All of them read state; only the restart route acts.

use axum::extract::State;
use axum::Json;
use pl_03_consensus::{ConsensusApi, EngineStatus};
use tracing::warn;

use crate::domain::{
    ApiResult, BlockchainSummary, ConsensusHealth, RestartResponse, ServicesResponse,
    StatusSummary,
};
use crate::router::AppState;

/// `GET /health/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusSummary> {
    let engine = state.supervisor.engine();
    let engine_status = engine.status();
    let snapshot = state.supervisor.snapshot();

    Json(StatusSummary {
        active: state.supervisor.is_engine_loop_running() && engine_status.accepts_work(),
        chain_head_index: snapshot.chain_head_index,
        desynced: snapshot.desync_detected || engine_status == EngineStatus::Desynced,
    })
}

/// `GET /health/consensus`
pub async fn consensus(State(state): State<AppState>) -> Json<ConsensusHealth> {
    Json(ConsensusHealth {
        engine: state.supervisor.engine().status_report(),
        supervisor: state.supervisor.snapshot(),
    })
}

/// `GET /health/blockchain`
pub async fn blockchain(State(state): State<AppState>) -> Json<BlockchainSummary> {
    let chain = state.supervisor.engine().snapshot();
    Json(BlockchainSummary::from(chain.as_ref()))
}

/// `GET /health/services`
pub async fn services(State(state): State<AppState>) -> Json<ServicesResponse> {
    Json(ServicesResponse {
        services: state.supervisor.services(),
    })
}

/// `POST /health/consensus/restart`
pub async fn restart_consensus(State(state): State<AppState>) -> ApiResult<Json<RestartResponse>> {
    warn!("[pl-06] Operator requested consensus restart");
    let report = state.supervisor.force_restart().await?;
    Ok(Json(RestartResponse {
        restarted: true,
        head_index: report.head_index,
        reconciled: report.reconciled,
    }))
}
