//! Campus reference data: geofence zones and the daily teaching timetable.
//!
//! Loaded once at startup from a JSON file named by `CAMPUS_CONFIG_PATH` and
//! shared read-only across all requests. Every structural rule the runtime
//! relies on (non-empty zones, sane coordinates, non-overlapping slots) is
//! enforced here at load time, so the schedulers and evaluators downstream
//! never have to re-check it.

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed width of every teaching slot, in minutes.
pub const SLOT_MINUTES: u32 = 55;

/// A circular campus boundary: centre plus radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoZone {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: f64,
}

/// Wall-clock start of a teaching slot in campus-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStart {
    pub hour: u32,
    pub minute: u32,
}

impl SlotStart {
    pub fn as_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }

    fn minutes_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CampusConfigError {
    #[error("failed to read campus config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse campus config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("campus config must define at least one geofence zone")]
    NoZones,
    #[error("zone '{0}' has a non-positive radius")]
    BadRadius(String),
    #[error("zone '{0}' has an out-of-range coordinate")]
    BadCoordinate(String),
    #[error("invalid UTC offset: {0} minutes")]
    BadOffset(i32),
    #[error("slot start {hour:02}:{minute:02} is not a valid time of day")]
    BadSlotTime { hour: u32, minute: u32 },
    #[error("slot starting {hour:02}:{minute:02} overlaps the previous slot")]
    OverlappingSlots { hour: u32, minute: u32 },
}

/// Static campus configuration: geofence zones, the daily slot timetable and
/// the campus-local timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampusConfig {
    pub zones: Vec<GeoZone>,
    pub slot_starts: Vec<SlotStart>,
    pub utc_offset_minutes: i32,
}

impl CampusConfig {
    /// Loads and validates the campus config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CampusConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates the campus config from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, CampusConfigError> {
        let config: CampusConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation; called by the loaders and directly by tests.
    pub fn validate(&self) -> Result<(), CampusConfigError> {
        if self.zones.is_empty() {
            return Err(CampusConfigError::NoZones);
        }
        for zone in &self.zones {
            if !(zone.radius_meters > 0.0) {
                return Err(CampusConfigError::BadRadius(zone.id.clone()));
            }
            if !(-90.0..=90.0).contains(&zone.lat) || !(-180.0..=180.0).contains(&zone.lng) {
                return Err(CampusConfigError::BadCoordinate(zone.id.clone()));
            }
        }
        if FixedOffset::east_opt(self.utc_offset_minutes * 60).is_none() {
            return Err(CampusConfigError::BadOffset(self.utc_offset_minutes));
        }

        // Slots must be listed in chronological order and may not overlap:
        // each start needs a full SLOT_MINUTES window before the next one.
        let mut previous: Option<&SlotStart> = None;
        for slot in &self.slot_starts {
            if slot.as_time().is_none() {
                return Err(CampusConfigError::BadSlotTime {
                    hour: slot.hour,
                    minute: slot.minute,
                });
            }
            if let Some(prev) = previous {
                if slot.minutes_of_day() < prev.minutes_of_day() + SLOT_MINUTES {
                    return Err(CampusConfigError::OverlappingSlots {
                        hour: slot.hour,
                        minute: slot.minute,
                    });
                }
            }
            previous = Some(slot);
        }
        Ok(())
    }

    /// The campus-local timezone as a fixed offset.
    ///
    /// # Panics
    /// Never panics after `validate()` has accepted the offset.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).expect("validated offset")
    }
}
