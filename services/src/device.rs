//! Device binding guard: one physical device per principal per calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::attendance_mark::Principal;
use db::models::device_day_binding;
use sea_orm::DatabaseConnection;

use crate::error::PresenceError;

/// Binds the fingerprint on the first check-in of the day (first-writer-wins)
/// and rejects any other device for the rest of that day. The mismatch is a
/// hard error, not silently ignored: the point is to deter one person
/// marking attendance for another.
pub async fn check_and_bind(
    db: &DatabaseConnection,
    principal: &Principal,
    day: NaiveDate,
    fingerprint: &str,
    now: DateTime<Utc>,
) -> Result<(), PresenceError> {
    let binding =
        device_day_binding::Model::bind_or_get(db, principal, day, fingerprint, now).await?;

    if binding.fingerprint != fingerprint {
        tracing::warn!(
            principal_id = principal.id,
            %day,
            "self check-in rejected: device fingerprint mismatch"
        );
        return Err(PresenceError::DeviceMismatch);
    }
    Ok(())
}
