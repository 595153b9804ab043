//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the immutable campus reference data.
//! It is cheap to clone and passed into route handlers via Axum's `State<T>`
//! extractor.

use crate::campus::CampusConfig;
use crate::config::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Presence tuning knobs, resolved once at startup (or built directly in
/// tests) so request handlers never reach back into the env-backed config.
#[derive(Debug, Clone, Copy)]
pub struct PresenceSettings {
    pub lecture_rotation_seconds: u32,
    pub lecture_grace_seconds: u32,
    pub max_daily_self_marks: u32,
}

impl PresenceSettings {
    pub fn from_config() -> Self {
        let config = AppConfig::global();
        Self {
            lecture_rotation_seconds: config.lecture_rotation_seconds,
            lecture_grace_seconds: config.lecture_grace_seconds,
            max_daily_self_marks: config.max_daily_self_marks,
        }
    }
}

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The validated campus configuration (geofence zones, slot timetable),
///   loaded once and shared without locking.
/// - The presence settings (rotation cadence, daily mark cap).
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    campus: Arc<CampusConfig>,
    settings: PresenceSettings,
}

impl AppState {
    pub fn new(db: DatabaseConnection, campus: Arc<CampusConfig>, settings: PresenceSettings) -> Self {
        Self {
            db,
            campus,
            settings,
        }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the shared campus reference data.
    pub fn campus(&self) -> &CampusConfig {
        &self.campus
    }

    /// Returns the presence settings resolved at startup.
    pub fn settings(&self) -> &PresenceSettings {
        &self.settings
    }

    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawned tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
