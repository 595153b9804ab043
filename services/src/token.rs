//! Token issuance: bulk exam tokens and the short-lived rotating lecture
//! token, plus the QR payload each one travels in.
//!
//! Secrets are opaque 32-byte random strings; the QR payload carries the
//! scope identifiers in cleartext so the validator can find the token row
//! without a reverse index. Security rests on secret unguessability and the
//! freshness checks, not payload confidentiality.

use chrono::{DateTime, Duration, Utc};
use db::models::{exam, lecture, presence_token};
use hmac::{Hmac, Mac};
use sea_orm::DatabaseConnection;
use serde_json::json;
use sha2::Sha256;
use util::campus::CampusConfig;

use crate::error::PresenceError;
use crate::slot;

type HmacSha256 = Hmac<Sha256>;

/// A freshly rotated lecture token, ready for the presenter's QR view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LectureQr {
    pub lecture_id: i64,
    /// The JSON document the QR view renders; scanners decode it back into a
    /// scan claim.
    pub payload: serde_json::Value,
    /// Short numeric fallback code shown beside the QR for manual entry.
    pub display_code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues one exam token per (subject, student) pair that does not already
/// hold a valid one. Safe to call repeatedly: exam edits re-trigger issuance
/// and only newly added combinations receive tokens.
pub async fn issue_exam_tokens(
    db: &DatabaseConnection,
    exam_id: i64,
    subject_ids: &[i64],
    student_ids: &[i64],
) -> Result<u64, PresenceError> {
    if !exam::Model::exists(db, exam_id).await? {
        return Err(PresenceError::ScopeNotFound);
    }

    let mut pairs = Vec::with_capacity(subject_ids.len() * student_ids.len());
    for &subject_id in subject_ids {
        for &student_id in student_ids {
            pairs.push((subject_id, student_id));
        }
    }

    let issued = presence_token::Model::issue_exam_batch(db, exam_id, &pairs).await?;
    tracing::info!(exam_id, issued, "issued exam presence tokens");
    Ok(issued)
}

/// Rotates the lecture token and returns the new QR content.
///
/// Called on every poll while the presenter keeps the QR view open; closing
/// the view simply stops polling and the last token ages out via its TTL.
/// Fails `SlotClosed` when no teaching slot is open at `now`.
pub async fn issue_lecture_token(
    db: &DatabaseConnection,
    campus: &CampusConfig,
    lecture_id: i64,
    rotation_seconds: u32,
    grace_seconds: u32,
    now: DateTime<Utc>,
) -> Result<LectureQr, PresenceError> {
    if !lecture::Model::exists(db, lecture_id).await? {
        return Err(PresenceError::ScopeNotFound);
    }
    if slot::current_slot(now, campus).is_none() {
        return Err(PresenceError::SlotClosed);
    }

    let ttl = Duration::seconds(i64::from(rotation_seconds) + i64::from(grace_seconds));
    let token = presence_token::Model::rotate_lecture(db, lecture_id, ttl, now).await?;
    let expires_at = token.expires_at.unwrap_or(now + ttl);

    Ok(LectureQr {
        lecture_id,
        payload: lecture_qr_payload(lecture_id, &token.secret),
        display_code: display_code(&token.secret, rotation_window(now, rotation_seconds)),
        expires_at,
    })
}

/// QR payload for an exam token: scope in cleartext plus the opaque secret.
pub fn exam_qr_payload(exam_id: i64, subject_id: i64, student_id: i64, secret: &str) -> serde_json::Value {
    json!({
        "kind": "exam",
        "exam_id": exam_id,
        "subject_id": subject_id,
        "student_id": student_id,
        "secret": secret,
    })
}

/// QR payload for a lecture token.
pub fn lecture_qr_payload(lecture_id: i64, secret: &str) -> serde_json::Value {
    json!({
        "kind": "lecture",
        "lecture_id": lecture_id,
        "secret": secret,
    })
}

/// The rotation window `now` falls into.
pub fn rotation_window(now: DateTime<Utc>, rotation_seconds: u32) -> i64 {
    now.timestamp().div_euclid(i64::from(rotation_seconds.max(1)))
}

/// Derives the 6-digit display code for a secret and rotation window
/// (HMAC-SHA256 with dynamic truncation).
pub fn display_code(secret: &str, window: i64) -> String {
    const DIGITS: u32 = 6;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key");
    mac.update(&window.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[31] & 0x0f) as usize;
    let slice = &digest[offset..offset + 4];
    let val = u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]) & 0x7fff_ffff;

    let modulus = 10u32.pow(DIGITS);
    let num = val % modulus;

    let mut s = num.to_string();
    while s.len() < DIGITS as usize {
        s.insert(0, '0');
    }
    s
}
