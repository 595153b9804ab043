//! Shared helpers for route handlers.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use services::PresenceError;

use crate::response::ApiResponse;

/// Maps a domain error onto the HTTP surface. Every rejection carries its
/// human-readable reason in the standard envelope; store errors are logged
/// and hidden behind a generic message.
pub fn presence_error<T>(err: PresenceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = match &err {
        PresenceError::ScopeNotFound => StatusCode::NOT_FOUND,
        PresenceError::Conflict => StatusCode::CONFLICT,
        PresenceError::Store(db_err) => {
            tracing::error!(error = %db_err, "presence store error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ApiResponse::error(err.to_string())))
}
