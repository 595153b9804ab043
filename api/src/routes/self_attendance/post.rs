use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use services::self_attendance::{self, SelfMarkRequest};
use util::state::AppState;
use validator::Validate;

use super::common::{SelfMarkReq, SelfMarkResponse};
use crate::response::ApiResponse;
use crate::routes::common::presence_error;

/// POST `/api/self-attendance/mark`
///
/// Records one geofenced self-check-in. Directions alternate Entry, Exit per
/// campus-local day up to the daily cap; the write is a pure append guarded
/// by the ledger's uniqueness constraint.
///
/// **Errors**: `400` with the specific reason (`outside the campus radius`,
/// device mismatch, daily cap), `409` when a concurrent request won the
/// write race (safe to retry).
pub async fn mark(
    State(state): State<AppState>,
    Json(body): Json<SelfMarkReq>,
) -> (StatusCode, Json<ApiResponse<SelfMarkResponse>>) {
    if let Err(errors) = body.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(errors.to_string())),
        );
    }

    let request = SelfMarkRequest {
        principal: body.principal,
        lat: body.lat,
        lng: body.lng,
        device_fingerprint: body.device_fingerprint,
    };

    match self_attendance::mark(
        state.db(),
        state.campus(),
        &request,
        state.settings().max_daily_self_marks,
        Utc::now(),
    )
    .await
    {
        Ok(mark) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SelfMarkResponse::from(mark),
                "Attendance recorded",
            )),
        ),
        Err(err) => presence_error(err),
    }
}
