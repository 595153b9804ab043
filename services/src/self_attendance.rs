//! Geofenced self-check-in for staff: mark, live status and monthly history.
//!
//! The write path is geofence → device guard → daily cap → parity direction
//! → conditional append. The cap is enforced by the insert itself (the
//! `(principal, day, seq)` correlation key is unique), so concurrent
//! requests from one principal cannot overshoot it.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use db::models::attendance_mark::{self, Direction, Principal};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use util::campus::CampusConfig;

use crate::device;
use crate::error::PresenceError;
use crate::geofence;

#[derive(Debug, Clone)]
pub struct SelfMarkRequest {
    pub principal: Principal,
    pub lat: f64,
    pub lng: f64,
    pub device_fingerprint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearestZoneInfo {
    pub zone_id: String,
    pub zone_name: String,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfStatus {
    pub marks_today: u64,
    pub max_allowed: u32,
    pub can_mark: bool,
    /// Only present when the caller supplied a live location.
    pub inside_any: Option<bool>,
    pub nearest_zone: Option<NearestZoneInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub first_entry: Option<DateTime<Utc>>,
    pub last_exit: Option<DateTime<Utc>>,
    /// True when the day holds both an entry and an exit.
    pub complete: bool,
    pub minutes_on_site: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfStatistics {
    pub days_present: u64,
    pub completed_days: u64,
    pub total_minutes_on_site: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfHistory {
    pub records: Vec<attendance_mark::Model>,
    pub daily_summary: Vec<DaySummary>,
    pub statistics: SelfStatistics,
}

fn local_day(now: DateTime<Utc>, campus: &CampusConfig) -> NaiveDate {
    now.with_timezone(&campus.timezone()).date_naive()
}

/// Records one self-check-in mark. Directions alternate Entry, Exit by the
/// count of marks already written today; the append never updates an
/// existing row.
pub async fn mark(
    db: &DatabaseConnection,
    campus: &CampusConfig,
    request: &SelfMarkRequest,
    max_daily_marks: u32,
    now: DateTime<Utc>,
) -> Result<attendance_mark::Model, PresenceError> {
    let evaluation = geofence::evaluate(request.lat, request.lng, &campus.zones);
    if !evaluation.inside_any {
        return Err(PresenceError::OutOfGeofence);
    }
    let resolved_zone = evaluation
        .nearest
        .map(|n| n.zone.id.clone())
        .unwrap_or_default();

    let day = local_day(now, campus);
    device::check_and_bind(db, &request.principal, day, &request.device_fingerprint, now).await?;

    let count =
        attendance_mark::Model::count_self_marks_for_day(db, &request.principal, day).await?;
    if count >= u64::from(max_daily_marks) {
        return Err(PresenceError::DailyCapReached);
    }

    let direction = if count % 2 == 0 {
        Direction::Entry
    } else {
        Direction::Exit
    };

    attendance_mark::Model::append_self_mark(
        db,
        &request.principal,
        day,
        count,
        direction,
        now,
        (request.lat, request.lng),
        resolved_zone,
        request.device_fingerprint.clone(),
    )
    .await?
    .ok_or(PresenceError::Conflict)
}

/// Live status for the "am I in range yet" polling UI. Geofence is
/// recomputed only when a location is supplied; otherwise the response is
/// purely ledger-derived.
pub async fn status(
    db: &DatabaseConnection,
    campus: &CampusConfig,
    principal: &Principal,
    location: Option<(f64, f64)>,
    max_daily_marks: u32,
    now: DateTime<Utc>,
) -> Result<SelfStatus, PresenceError> {
    let day = local_day(now, campus);
    let marks_today = attendance_mark::Model::count_self_marks_for_day(db, principal, day).await?;

    let (inside_any, nearest_zone) = match location {
        Some((lat, lng)) => {
            let evaluation = geofence::evaluate(lat, lng, &campus.zones);
            let nearest = evaluation.nearest.map(|n| NearestZoneInfo {
                zone_id: n.zone.id.clone(),
                zone_name: n.zone.name.clone(),
                distance_meters: n.distance_meters,
            });
            (Some(evaluation.inside_any), nearest)
        }
        None => (None, None),
    };

    let can_mark = marks_today < u64::from(max_daily_marks) && inside_any.unwrap_or(true);

    Ok(SelfStatus {
        marks_today,
        max_allowed: max_daily_marks,
        can_mark,
        inside_any,
        nearest_zone,
    })
}

/// Monthly history: raw records, one summary per day with marks, and
/// aggregate statistics. Defaults to the current campus-local month.
pub async fn history(
    db: &DatabaseConnection,
    campus: &CampusConfig,
    principal: &Principal,
    month: Option<(i32, u32)>,
    now: DateTime<Utc>,
) -> Result<SelfHistory, PresenceError> {
    let today = local_day(now, campus);
    let (year, month) = month.unwrap_or((today.year(), today.month()));

    let from = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| PresenceError::Store(sea_orm::DbErr::Custom(format!(
            "invalid month {year}-{month}"
        ))))?;
    let to = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .map(|d| d.pred_opt().unwrap_or(d))
    .unwrap_or(from);

    let records = attendance_mark::Model::self_marks_between(db, principal, from, to).await?;

    let mut daily_summary: Vec<DaySummary> = Vec::new();
    for record in &records {
        let Some(day) = record.local_day else { continue };

        if daily_summary.last().map(|s| s.day) != Some(day) {
            daily_summary.push(DaySummary {
                day,
                first_entry: None,
                last_exit: None,
                complete: false,
                minutes_on_site: None,
            });
        }
        let summary = daily_summary.last_mut().expect("pushed above");
        match record.direction {
            Direction::Entry => {
                if summary.first_entry.is_none() {
                    summary.first_entry = Some(record.recorded_at);
                }
            }
            Direction::Exit => summary.last_exit = Some(record.recorded_at),
            _ => {}
        }
    }
    for summary in &mut daily_summary {
        if let (Some(entry), Some(exit)) = (summary.first_entry, summary.last_exit) {
            summary.complete = true;
            summary.minutes_on_site = Some((exit - entry).num_minutes());
        }
    }

    let days_present = daily_summary.len() as u64;
    let completed_days = daily_summary.iter().filter(|s| s.complete).count() as u64;
    let total_minutes_on_site = daily_summary
        .iter()
        .filter_map(|s| s.minutes_on_site)
        .sum();

    Ok(SelfHistory {
        records,
        daily_summary,
        statistics: SelfStatistics {
            days_present,
            completed_days,
            total_minutes_on_site,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;
    use util::campus::{GeoZone, SlotStart};

    const ZONE_LAT: f64 = 12.9716;
    const ZONE_LNG: f64 = 77.5946;

    fn campus() -> CampusConfig {
        CampusConfig {
            zones: vec![GeoZone {
                id: "main".into(),
                name: "Main Campus".into(),
                lat: ZONE_LAT,
                lng: ZONE_LNG,
                radius_meters: 150.0,
            }],
            slot_starts: vec![SlotStart { hour: 8, minute: 15 }],
            utc_offset_minutes: 330,
        }
    }

    fn request(fingerprint: &str) -> SelfMarkRequest {
        SelfMarkRequest {
            principal: Principal::personnel(7),
            lat: ZONE_LAT,
            lng: ZONE_LNG,
            device_fingerprint: fingerprint.into(),
        }
    }

    #[tokio::test]
    async fn marks_alternate_entry_exit_then_hit_the_cap() {
        let db = setup_test_db().await;
        let campus = campus();
        let req = request("fp-a");
        // Fixed instant: 06:30 campus-local, so +9h stays on the same day.
        let now = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 7, 1, 0, 0).unwrap();

        let first = mark(&db, &campus, &req, 2, now).await.unwrap();
        assert_eq!(first.direction, Direction::Entry);

        let second = mark(&db, &campus, &req, 2, now + chrono::Duration::hours(8))
            .await
            .unwrap();
        assert_eq!(second.direction, Direction::Exit);

        let err = mark(&db, &campus, &req, 2, now + chrono::Duration::hours(9))
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::DailyCapReached));
    }

    #[tokio::test]
    async fn out_of_geofence_writes_nothing() {
        let db = setup_test_db().await;
        let campus = campus();
        let mut req = request("fp-a");
        req.lat += 0.01; // ~1.1 km north of the zone

        let err = mark(&db, &campus, &req, 2, Utc::now()).await.unwrap_err();
        assert!(matches!(err, PresenceError::OutOfGeofence));

        let count = attendance_mark::Model::count_self_marks_for_day(
            &db,
            &req.principal,
            local_day(Utc::now(), &campus),
        )
        .await
        .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn second_device_is_rejected_same_day() {
        let db = setup_test_db().await;
        let campus = campus();
        let now = Utc::now();

        mark(&db, &campus, &request("fp-a"), 2, now).await.unwrap();
        let err = mark(&db, &campus, &request("fp-b"), 2, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::DeviceMismatch));
    }

    #[tokio::test]
    async fn status_reflects_count_and_live_geofence() {
        let db = setup_test_db().await;
        let campus = campus();
        let principal = Principal::personnel(7);
        let now = Utc::now();

        let before = status(&db, &campus, &principal, None, 2, now).await.unwrap();
        assert_eq!(before.marks_today, 0);
        assert!(before.can_mark);
        assert!(before.inside_any.is_none());

        mark(&db, &campus, &request("fp-a"), 2, now).await.unwrap();

        let inside = status(
            &db,
            &campus,
            &principal,
            Some((ZONE_LAT, ZONE_LNG)),
            2,
            now,
        )
        .await
        .unwrap();
        assert_eq!(inside.marks_today, 1);
        assert_eq!(inside.inside_any, Some(true));
        assert!(inside.can_mark);
        assert_eq!(inside.nearest_zone.unwrap().zone_id, "main");

        let outside = status(
            &db,
            &campus,
            &principal,
            Some((ZONE_LAT + 0.01, ZONE_LNG)),
            2,
            now,
        )
        .await
        .unwrap();
        assert_eq!(outside.inside_any, Some(false));
        assert!(!outside.can_mark);
    }

    #[tokio::test]
    async fn history_summarises_complete_days() {
        let db = setup_test_db().await;
        let campus = campus();
        let principal = Principal::personnel(7);
        // Fixed instant mid-month, campus-local morning.
        let now = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 7, 3, 30, 0).unwrap();

        mark(&db, &campus, &request("fp-a"), 2, now).await.unwrap();
        mark(
            &db,
            &campus,
            &request("fp-a"),
            2,
            now + chrono::Duration::hours(8),
        )
        .await
        .unwrap();

        let history = history(&db, &campus, &principal, Some((2026, 8)), now)
            .await
            .unwrap();
        assert_eq!(history.records.len(), 2);
        assert_eq!(history.daily_summary.len(), 1);

        let day = &history.daily_summary[0];
        assert!(day.complete);
        assert_eq!(day.minutes_on_site, Some(8 * 60));
        assert_eq!(history.statistics.days_present, 1);
        assert_eq!(history.statistics.completed_days, 1);
        assert_eq!(history.statistics.total_minutes_on_site, 8 * 60);
    }
}
