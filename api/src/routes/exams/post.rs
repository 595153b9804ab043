use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::presence_error;

#[derive(Deserialize, Validate)]
pub struct IssueTokensReq {
    /// Subjects the exam covers; supplied by the exam registry.
    #[validate(length(min = 1, message = "at least one subject is required"))]
    pub subject_ids: Vec<i64>,
    /// Students registered for the exam.
    #[validate(length(min = 1, message = "at least one student is required"))]
    pub student_ids: Vec<i64>,
}

#[derive(Serialize, Default)]
pub struct IssueTokensResponse {
    /// Number of tokens actually created; pairs that already held a valid
    /// token are left untouched.
    pub issued: u64,
}

/// POST `/api/exams/{exam_id}/tokens`
///
/// Bulk-issues presence tokens for every (subject, student) pair. Idempotent:
/// exam edits can re-trigger issuance and only newly added pairs get tokens.
pub async fn issue_exam_tokens(
    State(state): State<AppState>,
    Path(exam_id): Path<i64>,
    Json(body): Json<IssueTokensReq>,
) -> (StatusCode, Json<ApiResponse<IssueTokensResponse>>) {
    if let Err(errors) = body.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(errors.to_string())),
        );
    }

    match services::token::issue_exam_tokens(
        state.db(),
        exam_id,
        &body.subject_ids,
        &body.student_ids,
    )
    .await
    {
        Ok(issued) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                IssueTokensResponse { issued },
                "Exam presence tokens issued",
            )),
        ),
        Err(err) => presence_error(err),
    }
}
