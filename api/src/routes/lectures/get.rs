use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::presence_error;

#[derive(Serialize, Default)]
pub struct LectureQrResponse {
    /// The JSON document the presenter's QR view renders. Scope identifiers
    /// travel in cleartext; only the secret's unguessability matters.
    pub payload: serde_json::Value,
    /// Numeric fallback code for manual entry, shown beside the QR.
    pub display_code: String,
    /// ISO-8601 (UTC); the client polls again before this.
    pub expires_at: String,
}

/// GET `/api/lectures/{lecture_id}/qr`
///
/// Rotates the lecture token and returns the fresh QR content. Called on a
/// short cadence while the presenter keeps the QR view open; each call
/// invalidates the previous secret. Rotation is client-driven: closing the
/// view stops polling and the last token simply ages out.
///
/// **Errors**: `404` unknown lecture, `400` when no teaching slot is open.
pub async fn lecture_qr(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<LectureQrResponse>>) {
    let settings = state.settings();

    match services::token::issue_lecture_token(
        state.db(),
        state.campus(),
        lecture_id,
        settings.lecture_rotation_seconds,
        settings.lecture_grace_seconds,
        Utc::now(),
    )
    .await
    {
        Ok(qr) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                LectureQrResponse {
                    payload: qr.payload,
                    display_code: qr.display_code,
                    expires_at: qr.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                },
                "Lecture code rotated",
            )),
        ),
        Err(err) => presence_error(err),
    }
}
