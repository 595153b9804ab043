use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{Datelike, NaiveDate, Utc};
use db::models::attendance_mark::Principal;
use services::self_attendance;
use util::state::AppState;

use super::common::{HistoryQuery, HistoryResponse, StatusQuery, StatusResponse};
use crate::response::ApiResponse;
use crate::routes::common::presence_error;

/// GET `/api/self-attendance/status`
///
/// Ledger-derived counts for today plus, when `lat`/`lng` are supplied, a
/// live geofence evaluation: this is what the "am I in range yet" polling
/// UI hits every few seconds.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> (StatusCode, Json<ApiResponse<StatusResponse>>) {
    let principal = Principal {
        kind: query.principal_type,
        id: query.principal_id,
    };
    let location = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };

    match self_attendance::status(
        state.db(),
        state.campus(),
        &principal,
        location,
        state.settings().max_daily_self_marks,
        Utc::now(),
    )
    .await
    {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StatusResponse::from(status),
                "Self attendance status",
            )),
        ),
        Err(err) => presence_error(err),
    }
}

/// GET `/api/self-attendance/history`
///
/// Records, per-day summaries and aggregate statistics for a month
/// (`month=YYYY-MM`, defaulting to the current campus-local month).
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> (StatusCode, Json<ApiResponse<HistoryResponse>>) {
    let principal = Principal {
        kind: query.principal_type,
        id: query.principal_id,
    };

    let month = match &query.month {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d");
            match parsed {
                Ok(date) => Some((date.year(), date.month())),
                Err(_) => {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(ApiResponse::error("month must be formatted YYYY-MM")),
                    );
                }
            }
        }
        None => None,
    };

    match self_attendance::history(state.db(), state.campus(), &principal, month, Utc::now()).await
    {
        Ok(history) => {
            let response = HistoryResponse {
                records: history.records.into_iter().map(Into::into).collect(),
                daily_summary: history.daily_summary.into_iter().map(Into::into).collect(),
                statistics: history.statistics.into(),
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Self attendance history")),
            )
        }
        Err(err) => presence_error(err),
    }
}
