//! HTTP route entry point for `/api/...`.
//!
//! Routes are organized by domain, one router per group:
//! - `/health` → liveness check (public)
//! - `/exams` → exam presence-token issuance
//! - `/lectures` → rotating lecture QR polling
//! - `/attendance` → scan ingestion (single / bulk / date modes)
//! - `/self-attendance` → geofenced staff check-in, status and history
//!
//! Authentication is handled upstream by the portal; every principal id
//! reaching these handlers is already trusted.

use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod common;
pub mod exams;
pub mod health;
pub mod lectures;
pub mod self_attendance;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` as its state type and mounts
/// all core API routes under their respective base paths.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/exams", exams::exam_routes())
        .nest("/lectures", lectures::lecture_routes())
        .nest("/attendance", attendance::attendance_routes())
        .nest(
            "/self-attendance",
            self_attendance::self_attendance_routes(),
        )
        .with_state(app_state)
}
