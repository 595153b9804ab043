use sea_orm::DbErr;

/// Error taxonomy for presence verification. Every check short-circuits on
/// the first failure and no partial writes happen on any failure path.
///
/// `Conflict` is the one retryable case: a concurrent request won the write
/// race and the client may safely resubmit the same claim. A benign repeat
/// scan is *not* an error and is reported through
/// [`crate::scan::ScanStatus::AlreadyMarked`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("Invalid or unrecognised presence code")]
    InvalidToken,

    #[error("Presence code has expired, scan the current one")]
    TokenExpired,

    #[error("Exam or lecture not found")]
    ScopeNotFound,

    #[error("No teaching slot is open right now")]
    SlotClosed,

    #[error("Location is outside the campus radius")]
    OutOfGeofence,

    #[error("Attendance for today is locked to a different device")]
    DeviceMismatch,

    #[error("Daily attendance limit already reached")]
    DailyCapReached,

    #[error("Another request got there first, please retry")]
    Conflict,

    #[error("Database error: {0}")]
    Store(#[from] DbErr),
}
