use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::response::ApiResponse;

#[derive(Serialize, Default)]
pub struct HealthResponse {
    pub ok: bool,
}

/// GET `/api/health`
pub async fn health() -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            HealthResponse { ok: true },
            "Service healthy",
        )),
    )
}
