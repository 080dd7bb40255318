use axum::{
    extract::{Query, State},
    Extension, Json,
};
use hnscout_pipeline::ReportSnapshot;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct DiscoveriesQuery {
    pub limit: Option<i64>,
    pub days: Option<u32>,
}

/// Report snapshot for the dashboard: top discoveries in the window.
pub(super) async fn list_discoveries(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DiscoveriesQuery>,
) -> Result<Json<ApiResponse<ReportSnapshot>>, ApiError> {
    let days = query.days.unwrap_or(state.report_days);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("days must be between 1 and {MAX_DAYS}"),
        ));
    }
    let limit = normalize_limit(query.limit, state.report_limit);

    let snapshot = hnscout_pipeline::build_snapshot(state.store.as_ref(), limit, days)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: snapshot,
        meta: ResponseMeta::new(req_id.0),
    }))
}
