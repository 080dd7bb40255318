use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use hnscout_core::StoredRun;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_RUNS_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunTriggered {
    status: &'static str,
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<StoredRun>>>, ApiError> {
    let runs = state
        .store
        .list_runs(normalize_limit(query.limit, DEFAULT_RUNS_LIMIT))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: runs,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Start an incremental run in the background.
pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<RunTriggered>>), ApiError> {
    let Some(runner) = state.runner.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "unavailable",
            "no classifier configured; runs are disabled",
        ));
    };

    if runner.try_start().is_none() {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "a run is already in progress",
        ));
    }

    tracing::info!(request_id = %req_id.0, "run triggered via api");
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RunTriggered { status: "started" },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
