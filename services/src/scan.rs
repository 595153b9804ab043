//! The scan validator: accepts a submitted claim, checks token state,
//! freshness and secret equality, then performs the single authoritative
//! ledger write.
//!
//! The three ingestion modes (single, bulk, date) only differ in which
//! (exam, subject) scopes they admit; they all funnel into [`validate_scan`]
//! and never re-implement its steps.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::attendance_mark::{
    self, Direction, MarkKind, Principal, PresenceWrite, exam_correlation_key,
    lecture_correlation_key,
};
use db::models::presence_token::{self, exam_scope_key, lecture_scope_key};
use db::models::{exam, student};
use sea_orm::DatabaseConnection;

use crate::error::PresenceError;

/// One (exam, subject) combination an operator is scanning for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ExamSubjectRef {
    pub exam_id: i64,
    pub subject_id: i64,
}

/// Candidate-scope generator for exam scans. Thin configuration over the one
/// validator: a scope filter, nothing more.
#[derive(Debug, Clone)]
pub enum ScanScope {
    /// One active (exam, subject) context; claims for anything else are
    /// rejected.
    Single(ExamSubjectRef),
    /// A pre-selected set of combinations; each claim is matched against
    /// whichever combination its scope encodes, independently.
    Bulk(Vec<ExamSubjectRef>),
    /// Combinations derived from every exam scheduled on the given date.
    Date(NaiveDate),
}

impl ScanScope {
    /// Whether this mode admits a claim for (exam, subject).
    pub async fn permits(
        &self,
        db: &DatabaseConnection,
        exam_id: i64,
        subject_id: i64,
    ) -> Result<bool, PresenceError> {
        match self {
            ScanScope::Single(combo) => {
                Ok(combo.exam_id == exam_id && combo.subject_id == subject_id)
            }
            ScanScope::Bulk(combos) => Ok(combos
                .iter()
                .any(|c| c.exam_id == exam_id && c.subject_id == subject_id)),
            ScanScope::Date(date) => {
                let ids = exam::Model::ids_scheduled_on(db, *date).await?;
                Ok(ids.contains(&exam_id))
            }
        }
    }
}

/// A decoded QR payload as submitted by a scanning client.
#[derive(Debug, Clone)]
pub enum ScanClaim {
    Exam {
        exam_id: i64,
        subject_id: i64,
        student_id: i64,
        secret: String,
    },
    Lecture {
        lecture_id: i64,
        student_id: i64,
        secret: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Present,
    /// The principal was already marked present. Rescans are common UI
    /// behavior, so this is a friendly confirmation, not an error.
    AlreadyMarked,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub student_name: Option<String>,
    pub mark: attendance_mark::Model,
}

/// Validates one scan and writes the ledger exactly once.
///
/// Steps, in order, first failure short-circuits:
/// 1. mode filter (exam claims only): `ScopeNotFound`
/// 2. token lookup by scope: `InvalidToken`
/// 3. freshness (revocation, TTL): `InvalidToken` or `TokenExpired`
/// 4. secret equality: `InvalidToken` (covers stale rotated codes)
/// 5. ledger short-circuit: `AlreadyMarked` as success
/// 6. atomic upsert of the `Present` mark
pub async fn validate_scan(
    db: &DatabaseConnection,
    claim: &ScanClaim,
    scope: Option<&ScanScope>,
    marked_by: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ScanOutcome, PresenceError> {
    if let (Some(scope), &ScanClaim::Exam {
        exam_id,
        subject_id,
        ..
    }) = (scope, claim)
    {
        if !scope.permits(db, exam_id, subject_id).await? {
            return Err(PresenceError::ScopeNotFound);
        }
    }

    let (scope_key, secret) = match claim {
        ScanClaim::Exam {
            exam_id,
            subject_id,
            student_id,
            secret,
        } => (exam_scope_key(*exam_id, *subject_id, *student_id), secret),
        ScanClaim::Lecture {
            lecture_id, secret, ..
        } => (lecture_scope_key(*lecture_id), secret),
    };

    let token = presence_token::Model::find_by_scope_key(db, &scope_key)
        .await?
        .ok_or(PresenceError::InvalidToken)?;

    if token.revoked {
        return Err(PresenceError::InvalidToken);
    }
    if let Some(expires_at) = token.expires_at {
        if now > expires_at {
            return Err(PresenceError::TokenExpired);
        }
    }
    if token.secret != *secret {
        return Err(PresenceError::InvalidToken);
    }

    let (kind, principal, correlation_key, exam_id, subject_id, lecture_id, student_id) =
        match claim {
            ScanClaim::Exam {
                exam_id,
                subject_id,
                student_id,
                ..
            } => (
                MarkKind::Exam,
                Principal::student(*student_id),
                exam_correlation_key(*exam_id, *subject_id),
                Some(*exam_id),
                Some(*subject_id),
                None,
                *student_id,
            ),
            ScanClaim::Lecture {
                lecture_id,
                student_id,
                ..
            } => (
                MarkKind::Lecture,
                Principal::student(*student_id),
                lecture_correlation_key(*lecture_id),
                None,
                None,
                Some(*lecture_id),
                *student_id,
            ),
        };

    let student_name = student::Model::display_name(db, student_id).await?;

    if let Some(existing) =
        attendance_mark::Model::find_by_correlation(db, &principal, &correlation_key).await?
    {
        if existing.direction == Direction::Present {
            return Ok(ScanOutcome {
                status: ScanStatus::AlreadyMarked,
                student_name,
                mark: existing,
            });
        }
    }

    let mark = attendance_mark::Model::upsert_present(
        db,
        PresenceWrite {
            kind,
            principal,
            exam_id,
            subject_id,
            lecture_id,
            correlation_key,
            recorded_at: now,
            marked_by,
        },
    )
    .await?;

    tracing::info!(
        principal_id = mark.principal_id,
        correlation_key = %mark.correlation_key,
        "presence mark recorded"
    );

    Ok(ScanOutcome {
        status: ScanStatus::Present,
        student_name,
        mark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use db::models::{lecture, presence_token::Model as Token};
    use db::test_utils::setup_test_db;
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait};

    async fn seed_exam(db: &DatabaseConnection) -> i64 {
        exam::Model::create(
            db,
            "Semester Final",
            NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
        )
        .await
        .unwrap()
        .id
    }

    fn exam_claim(exam_id: i64, subject_id: i64, student_id: i64, secret: &str) -> ScanClaim {
        ScanClaim::Exam {
            exam_id,
            subject_id,
            student_id,
            secret: secret.to_owned(),
        }
    }

    #[tokio::test]
    async fn scan_then_rescan_yields_one_row_and_already_marked() {
        let db = setup_test_db().await;
        let exam_id = seed_exam(&db).await;
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        Token::issue_exam_batch(&db, exam_id, &[(7, 100)]).await.unwrap();

        let token = Token::find_by_scope_key(&db, &exam_scope_key(exam_id, 7, 100))
            .await
            .unwrap()
            .unwrap();
        let claim = exam_claim(exam_id, 7, 100, &token.secret);

        let first = validate_scan(&db, &claim, None, Some(5), Utc::now())
            .await
            .unwrap();
        assert_eq!(first.status, ScanStatus::Present);
        assert_eq!(first.student_name.as_deref(), Some("Asha Rao"));
        assert_eq!(first.mark.marked_by, Some(5));

        let second = validate_scan(&db, &claim, None, Some(5), Utc::now())
            .await
            .unwrap();
        assert_eq!(second.status, ScanStatus::AlreadyMarked);
        assert_eq!(second.mark.id, first.mark.id);

        let rows = attendance_mark::Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn secret_from_another_scope_is_rejected() {
        let db = setup_test_db().await;
        let exam_id = seed_exam(&db).await;
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        Token::issue_exam_batch(&db, exam_id, &[(7, 100), (8, 100)])
            .await
            .unwrap();

        let subject7 = Token::find_by_scope_key(&db, &exam_scope_key(exam_id, 7, 100))
            .await
            .unwrap()
            .unwrap();

        // Subject 7's secret presented against subject 8's scope.
        let claim = exam_claim(exam_id, 8, 100, &subject7.secret);
        let err = validate_scan(&db, &claim, None, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::InvalidToken));
    }

    #[tokio::test]
    async fn unknown_scope_is_an_invalid_token() {
        let db = setup_test_db().await;
        let claim = exam_claim(1, 2, 3, "deadbeef");
        let err = validate_scan(&db, &claim, None, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::InvalidToken));
    }

    #[tokio::test]
    async fn rotated_out_lecture_secret_is_rejected_before_its_ttl() {
        let db = setup_test_db().await;
        let lec = lecture::Model::create(&db, 7, "Databases L9").await.unwrap();
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        let now = Utc::now();

        let first = Token::rotate_lecture(&db, lec.id, Duration::seconds(6), now)
            .await
            .unwrap();
        let second = Token::rotate_lecture(&db, lec.id, Duration::seconds(6), now)
            .await
            .unwrap();

        let stale = ScanClaim::Lecture {
            lecture_id: lec.id,
            student_id: 100,
            secret: first.secret.clone(),
        };
        let err = validate_scan(&db, &stale, None, None, now).await.unwrap_err();
        assert!(matches!(err, PresenceError::InvalidToken));

        let fresh = ScanClaim::Lecture {
            lecture_id: lec.id,
            student_id: 100,
            secret: second.secret.clone(),
        };
        let outcome = validate_scan(&db, &fresh, None, None, now).await.unwrap();
        assert_eq!(outcome.status, ScanStatus::Present);
    }

    #[tokio::test]
    async fn lecture_token_past_its_ttl_is_expired() {
        let db = setup_test_db().await;
        let lec = lecture::Model::create(&db, 7, "Databases L9").await.unwrap();
        let now = Utc::now();

        let token = Token::rotate_lecture(&db, lec.id, Duration::seconds(6), now)
            .await
            .unwrap();

        let claim = ScanClaim::Lecture {
            lecture_id: lec.id,
            student_id: 100,
            secret: token.secret.clone(),
        };
        let late = now + Duration::seconds(7);
        let err = validate_scan(&db, &claim, None, None, late).await.unwrap_err();
        assert!(matches!(err, PresenceError::TokenExpired));
    }

    #[tokio::test]
    async fn single_mode_rejects_other_combinations() {
        let db = setup_test_db().await;
        let exam_id = seed_exam(&db).await;
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        Token::issue_exam_batch(&db, exam_id, &[(7, 100), (8, 100)])
            .await
            .unwrap();

        let token8 = Token::find_by_scope_key(&db, &exam_scope_key(exam_id, 8, 100))
            .await
            .unwrap()
            .unwrap();

        let scope = ScanScope::Single(ExamSubjectRef {
            exam_id,
            subject_id: 7,
        });
        let claim = exam_claim(exam_id, 8, 100, &token8.secret);
        let err = validate_scan(&db, &claim, Some(&scope), None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::ScopeNotFound));
    }

    #[tokio::test]
    async fn date_mode_admits_every_exam_on_the_day() {
        let db = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let on_day = exam::Model::create(&db, "Final A", date).await.unwrap();
        let off_day = exam::Model::create(
            &db,
            "Final B",
            NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(),
        )
        .await
        .unwrap();
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        Token::issue_exam_batch(&db, on_day.id, &[(7, 100)]).await.unwrap();
        Token::issue_exam_batch(&db, off_day.id, &[(7, 100)]).await.unwrap();

        let scope = ScanScope::Date(date);

        let token = Token::find_by_scope_key(&db, &exam_scope_key(on_day.id, 7, 100))
            .await
            .unwrap()
            .unwrap();
        let ok = validate_scan(
            &db,
            &exam_claim(on_day.id, 7, 100, &token.secret),
            Some(&scope),
            None,
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(ok.status, ScanStatus::Present);

        let other = Token::find_by_scope_key(&db, &exam_scope_key(off_day.id, 7, 100))
            .await
            .unwrap()
            .unwrap();
        let err = validate_scan(
            &db,
            &exam_claim(off_day.id, 7, 100, &other.secret),
            Some(&scope),
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PresenceError::ScopeNotFound));
    }

    #[tokio::test]
    async fn absent_mark_is_flipped_not_duplicated() {
        let db = setup_test_db().await;
        let exam_id = seed_exam(&db).await;
        student::Model::create(&db, 100, "Asha Rao").await.unwrap();
        Token::issue_exam_batch(&db, exam_id, &[(7, 100)]).await.unwrap();

        // Seed a pre-existing Absent row the way a bulk absent-fill would.
        use sea_orm::ActiveValue::{NotSet, Set};
        db::models::attendance_mark::ActiveModel {
            id: NotSet,
            kind: Set(MarkKind::Exam),
            principal_type: Set(db::models::attendance_mark::PrincipalType::Student),
            principal_id: Set(100),
            exam_id: Set(Some(exam_id)),
            subject_id: Set(Some(7)),
            lecture_id: Set(None),
            correlation_key: Set(exam_correlation_key(exam_id, 7)),
            direction: Set(Direction::Absent),
            recorded_at: Set(Utc::now() - Duration::hours(1)),
            local_day: Set(None),
            claimed_lat: Set(None),
            claimed_lng: Set(None),
            resolved_zone: Set(None),
            device_fingerprint: Set(None),
            verified: Set(false),
            marked_by: Set(None),
        }
        .insert(&db)
        .await
        .unwrap();

        let token = Token::find_by_scope_key(&db, &exam_scope_key(exam_id, 7, 100))
            .await
            .unwrap()
            .unwrap();
        let outcome = validate_scan(
            &db,
            &exam_claim(exam_id, 7, 100, &token.secret),
            None,
            Some(9),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, ScanStatus::Present);
        assert_eq!(outcome.mark.direction, Direction::Present);
        assert_eq!(outcome.mark.marked_by, Some(9));

        let rows = attendance_mark::Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 1);
    }
}
