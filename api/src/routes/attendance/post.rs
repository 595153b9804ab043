use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use services::scan::{ScanClaim, ScanScope, ScanStatus};
use util::state::AppState;

use super::common::{ScanReq, ScanResponse};
use crate::response::ApiResponse;
use crate::routes::common::presence_error;

/// POST `/api/attendance/scan`
///
/// Validates one scanned claim and writes the ledger exactly once. Single,
/// bulk and date modes only change which (exam, subject) scopes are admitted;
/// the validation pipeline is shared.
///
/// A repeat scan of an already-present principal is a `200` with
/// `already_marked`; rescans are routine and must not read as failures.
pub async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanReq>,
) -> (StatusCode, Json<ApiResponse<ScanResponse>>) {
    let scope: Option<ScanScope> = body.mode.map(Into::into);
    let claim: ScanClaim = body.claim.into();

    match services::scan::validate_scan(
        state.db(),
        &claim,
        scope.as_ref(),
        body.marked_by,
        Utc::now(),
    )
    .await
    {
        Ok(outcome) => {
            let (status, message) = match outcome.status {
                ScanStatus::Present => ("present", "Attendance recorded"),
                ScanStatus::AlreadyMarked => ("already_marked", "Attendance already recorded"),
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    ScanResponse {
                        status: status.into(),
                        student_name: outcome.student_name,
                    },
                    message,
                )),
            )
        }
        Err(err) => presence_error(err),
    }
}
