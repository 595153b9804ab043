//! Request/response DTOs for the self-check-in surface.

use chrono::SecondsFormat;
use db::models::attendance_mark::{self, Principal, PrincipalType};
use serde::{Deserialize, Serialize};
use services::self_attendance::{DaySummary, SelfStatistics, SelfStatus};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SelfMarkReq {
    pub principal: Principal,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[validate(length(min = 1, message = "device fingerprint is required"))]
    pub device_fingerprint: String,
}

#[derive(Debug, Serialize, Default)]
pub struct SelfMarkResponse {
    /// `entry` or `exit`.
    pub direction: String,
    /// ISO-8601 (UTC).
    pub recorded_at: String,
    /// Campus-local calendar day the mark counts against.
    pub day: String,
    pub zone: Option<String>,
}

impl From<attendance_mark::Model> for SelfMarkResponse {
    fn from(mark: attendance_mark::Model) -> Self {
        Self {
            direction: mark.direction.to_string(),
            recorded_at: mark
                .recorded_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            day: mark.local_day.map(|d| d.to_string()).unwrap_or_default(),
            zone: mark.resolved_zone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub principal_type: PrincipalType,
    pub principal_id: i64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize, Default)]
pub struct NearestZoneDto {
    pub zone_id: String,
    pub zone_name: String,
    pub distance_meters: f64,
}

#[derive(Debug, Serialize, Default)]
pub struct StatusResponse {
    pub marks_today: u64,
    pub max_allowed: u32,
    pub can_mark: bool,
    /// Only present when the caller supplied a live location.
    pub inside_any: Option<bool>,
    pub nearest_zone: Option<NearestZoneDto>,
}

impl From<SelfStatus> for StatusResponse {
    fn from(status: SelfStatus) -> Self {
        Self {
            marks_today: status.marks_today,
            max_allowed: status.max_allowed,
            can_mark: status.can_mark,
            inside_any: status.inside_any,
            nearest_zone: status.nearest_zone.map(|n| NearestZoneDto {
                zone_id: n.zone_id,
                zone_name: n.zone_name,
                distance_meters: n.distance_meters,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub principal_type: PrincipalType,
    pub principal_id: i64,
    /// `YYYY-MM`; defaults to the current campus-local month.
    pub month: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct SelfRecordDto {
    pub direction: String,
    pub recorded_at: String,
    pub day: String,
    pub zone: Option<String>,
    pub device_fingerprint: Option<String>,
}

impl From<attendance_mark::Model> for SelfRecordDto {
    fn from(mark: attendance_mark::Model) -> Self {
        Self {
            direction: mark.direction.to_string(),
            recorded_at: mark
                .recorded_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            day: mark.local_day.map(|d| d.to_string()).unwrap_or_default(),
            zone: mark.resolved_zone,
            device_fingerprint: mark.device_fingerprint,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct DaySummaryDto {
    pub day: String,
    pub first_entry: Option<String>,
    pub last_exit: Option<String>,
    pub complete: bool,
    pub minutes_on_site: Option<i64>,
}

impl From<DaySummary> for DaySummaryDto {
    fn from(summary: DaySummary) -> Self {
        Self {
            day: summary.day.to_string(),
            first_entry: summary
                .first_entry
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            last_exit: summary
                .last_exit
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            complete: summary.complete,
            minutes_on_site: summary.minutes_on_site,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StatisticsDto {
    pub days_present: u64,
    pub completed_days: u64,
    pub total_minutes_on_site: i64,
}

impl From<SelfStatistics> for StatisticsDto {
    fn from(stats: SelfStatistics) -> Self {
        Self {
            days_present: stats.days_present,
            completed_days: stats.completed_days,
            total_minutes_on_site: stats.total_minutes_on_site,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct HistoryResponse {
    pub records: Vec<SelfRecordDto>,
    pub daily_summary: Vec<DaySummaryDto>,
    pub statistics: StatisticsDto,
}
