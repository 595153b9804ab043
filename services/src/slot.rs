//! Slot scheduling: maps wall-clock time (campus-local) to the currently
//! open teaching slot. Pure; callers re-evaluate on a timer rather than
//! caching across a boundary.

use chrono::{DateTime, Timelike, Utc};
use util::campus::{CampusConfig, SLOT_MINUTES};

/// An open teaching slot, expressed in seconds from campus-local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeachingSlot {
    pub index: usize,
    pub start_secs: u32,
    pub end_secs: u32,
}

impl TeachingSlot {
    pub fn start_hhmm(&self) -> (u32, u32) {
        (self.start_secs / 3600, self.start_secs % 3600 / 60)
    }
}

/// Returns the slot whose `[start, start + 55min)` window contains `now`,
/// or `None` when no slot is open. The timetable is validated at load, so
/// windows cannot overlap; if they somehow did, the first match in list
/// order wins.
pub fn current_slot(now: DateTime<Utc>, campus: &CampusConfig) -> Option<TeachingSlot> {
    let local = now.with_timezone(&campus.timezone());
    let local_secs = local.num_seconds_from_midnight();

    for (index, start) in campus.slot_starts.iter().enumerate() {
        let start_secs = (start.hour * 60 + start.minute) * 60;
        let end_secs = start_secs + SLOT_MINUTES * 60;
        if local_secs >= start_secs && local_secs < end_secs {
            return Some(TeachingSlot {
                index,
                start_secs,
                end_secs,
            });
        }
    }
    None
}
