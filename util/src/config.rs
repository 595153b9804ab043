//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub campus_config_path: String,
    pub lecture_rotation_seconds: u32,
    pub lecture_grace_seconds: u32,
    pub max_daily_self_marks: u32,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "campus-presence".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .unwrap(),
            campus_config_path: env::var("CAMPUS_CONFIG_PATH")
                .expect("CAMPUS_CONFIG_PATH is required"),
            lecture_rotation_seconds: env::var("LECTURE_ROTATION_SECONDS")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .unwrap(),
            lecture_grace_seconds: env::var("LECTURE_GRACE_SECONDS")
                .unwrap_or_else(|_| "2".into())
                .parse()
                .unwrap(),
            max_daily_self_marks: env::var("MAX_DAILY_SELF_MARKS")
                .unwrap_or_else(|_| "2".into())
                .parse()
                .unwrap(),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap();
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_campus_config_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.campus_config_path = value.into());
    }

    pub fn set_lecture_rotation_seconds(value: u32) {
        AppConfig::set_field(|cfg| cfg.lecture_rotation_seconds = value);
    }

    pub fn set_lecture_grace_seconds(value: u32) {
        AppConfig::set_field(|cfg| cfg.lecture_grace_seconds = value);
    }

    pub fn set_max_daily_self_marks(value: u32) {
        AppConfig::set_field(|cfg| cfg.max_daily_self_marks = value);
    }
}

// Convenience accessors used by binaries and route builders.

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn campus_config_path() -> String {
    AppConfig::global().campus_config_path.clone()
}

pub fn lecture_rotation_seconds() -> u32 {
    AppConfig::global().lecture_rotation_seconds
}

pub fn lecture_grace_seconds() -> u32 {
    AppConfig::global().lecture_grace_seconds
}

pub fn max_daily_self_marks() -> u32 {
    AppConfig::global().max_daily_self_marks
}
