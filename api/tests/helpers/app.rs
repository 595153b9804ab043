#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Timelike, Utc};
use db::test_utils::setup_test_db;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use util::campus::{CampusConfig, GeoZone, SlotStart};
use util::state::{AppState, PresenceSettings};

pub const ZONE_LAT: f64 = 12.9716;
pub const ZONE_LNG: f64 = 77.5946;

pub fn test_settings() -> PresenceSettings {
    PresenceSettings {
        lecture_rotation_seconds: 4,
        lecture_grace_seconds: 2,
        max_daily_self_marks: 2,
    }
}

fn main_zone() -> GeoZone {
    GeoZone {
        id: "main".into(),
        name: "Main Campus".into(),
        lat: ZONE_LAT,
        lng: ZONE_LNG,
        radius_meters: 150.0,
    }
}

/// Offset that puts campus-local time at roughly noon, so a slot around
/// midday is always open while the test runs, whatever the host clock says.
fn noon_offset_minutes() -> i32 {
    let now = Utc::now();
    let utc_minutes = (now.hour() * 60 + now.minute()) as i32;
    720 - utc_minutes
}

/// Campus whose timetable has a slot open "now" (local noon).
pub fn campus_open_now() -> CampusConfig {
    CampusConfig {
        zones: vec![main_zone()],
        slot_starts: vec![SlotStart {
            hour: 11,
            minute: 30,
        }],
        utc_offset_minutes: noon_offset_minutes(),
    }
}

/// Campus with an empty timetable: no slot is ever open.
pub fn campus_closed() -> CampusConfig {
    CampusConfig {
        zones: vec![main_zone()],
        slot_starts: vec![],
        utc_offset_minutes: noon_offset_minutes(),
    }
}

pub async fn make_test_app_with(campus: CampusConfig) -> (Router, AppState) {
    let db = setup_test_db().await;
    let app_state = AppState::new(db, Arc::new(campus), test_settings());

    let app = Router::new()
        .nest("/api", api::routes::routes(app_state.clone()))
        .with_state(app_state.clone());

    (app, app_state)
}

pub async fn make_test_app() -> (Router, AppState) {
    make_test_app_with(campus_open_now()).await
}

/// POSTs a JSON body and returns (status, parsed envelope).
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// GETs a path and returns (status, parsed envelope).
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
