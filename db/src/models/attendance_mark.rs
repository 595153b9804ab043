use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The presence ledger. One shape for exam, lecture and self-check-in marks.
///
/// The unique index on `(principal_type, principal_id, correlation_key)` is
/// the write-path guard: exam/lecture marks correlate to their entity
/// (`exam:{e}:{s}` / `lecture:{l}`) so a principal can hold at most one mark
/// per entity, and self-check-in marks correlate to `self:{day}:{seq}` so the
/// daily cap is enforced by the insert itself rather than a prior read.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_marks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: MarkKind,
    pub principal_type: PrincipalType,
    pub principal_id: i64,
    pub exam_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub lecture_id: Option<i64>,
    pub correlation_key: String,
    pub direction: Direction,
    pub recorded_at: DateTime<Utc>,
    /// Campus-local calendar day; populated for self-check-in marks.
    pub local_day: Option<Date>,
    pub claimed_lat: Option<f64>,
    pub claimed_lng: Option<f64>,
    pub resolved_zone: Option<String>,
    pub device_fingerprint: Option<String>,
    pub verified: bool,
    /// Personnel id of the operator whose scan produced the mark, for audit.
    pub marked_by: Option<i64>,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_mark_kind")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MarkKind {
    #[sea_orm(string_value = "exam")]
    Exam,
    #[sea_orm(string_value = "lecture")]
    Lecture,
    #[sea_orm(string_value = "self_check_in")]
    SelfCheckIn,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "principal_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PrincipalType {
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "personnel")]
    Personnel,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_direction")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "entry")]
    Entry,
    #[sea_orm(string_value = "exit")]
    Exit,
}

/// An already-authenticated actor, as handed to this core by upstream auth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub kind: PrincipalType,
    pub id: i64,
}

impl Principal {
    pub fn student(id: i64) -> Self {
        Self {
            kind: PrincipalType::Student,
            id,
        }
    }

    pub fn personnel(id: i64) -> Self {
        Self {
            kind: PrincipalType::Personnel,
            id,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Correlation key for an exam mark: one per (principal, exam, subject).
pub fn exam_correlation_key(exam_id: i64, subject_id: i64) -> String {
    format!("exam:{exam_id}:{subject_id}")
}

/// Correlation key for a lecture mark: one per (principal, lecture).
pub fn lecture_correlation_key(lecture_id: i64) -> String {
    format!("lecture:{lecture_id}")
}

/// Correlation key for the nth self-check-in of a campus-local day.
pub fn self_correlation_key(day: NaiveDate, seq: u64) -> String {
    format!("self:{day}:{seq}")
}

/// Everything the exam/lecture upsert needs to write a `Present` mark.
#[derive(Debug, Clone)]
pub struct PresenceWrite {
    pub kind: MarkKind,
    pub principal: Principal,
    pub exam_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub lecture_id: Option<i64>,
    pub correlation_key: String,
    pub recorded_at: DateTime<Utc>,
    pub marked_by: Option<i64>,
}

impl Model {
    pub async fn find_by_correlation(
        db: &DatabaseConnection,
        principal: &Principal,
        correlation_key: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::PrincipalType.eq(principal.kind.clone()))
            .filter(Column::PrincipalId.eq(principal.id))
            .filter(Column::CorrelationKey.eq(correlation_key))
            .one(db)
            .await
    }

    /// Writes a `Present` mark as a single atomic upsert.
    ///
    /// A new scan inserts the row; a scan racing an existing `Absent` (or
    /// concurrent) row flips it to `Present` in the same statement. Exactly
    /// one row can ever exist per (principal, correlated entity), enforced by
    /// the unique index rather than a read-then-write pair. The flip stamps
    /// the scan time.
    pub async fn upsert_present(
        db: &DatabaseConnection,
        write: PresenceWrite,
    ) -> Result<Self, DbErr> {
        let row = ActiveModel {
            id: NotSet,
            kind: Set(write.kind),
            principal_type: Set(write.principal.kind.clone()),
            principal_id: Set(write.principal.id),
            exam_id: Set(write.exam_id),
            subject_id: Set(write.subject_id),
            lecture_id: Set(write.lecture_id),
            correlation_key: Set(write.correlation_key.clone()),
            direction: Set(Direction::Present),
            recorded_at: Set(write.recorded_at),
            local_day: Set(None),
            claimed_lat: Set(None),
            claimed_lng: Set(None),
            resolved_zone: Set(None),
            device_fingerprint: Set(None),
            verified: Set(true),
            marked_by: Set(write.marked_by),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    Column::PrincipalType,
                    Column::PrincipalId,
                    Column::CorrelationKey,
                ])
                .update_columns([
                    Column::Direction,
                    Column::RecordedAt,
                    Column::Verified,
                    Column::MarkedBy,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find_by_correlation(db, &write.principal, &write.correlation_key)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("attendance mark {}", write.correlation_key))
            })
    }

    /// Appends a self-check-in mark without ever updating an existing row.
    ///
    /// The insert is conditional on the `(principal, day, seq)` correlation
    /// key: a concurrent request that grabbed the same sequence slot makes
    /// this statement affect zero rows, reported as `Ok(None)` so the caller
    /// can surface a retryable conflict instead of a duplicate mark.
    pub async fn append_self_mark(
        db: &DatabaseConnection,
        principal: &Principal,
        day: NaiveDate,
        seq: u64,
        direction: Direction,
        recorded_at: DateTime<Utc>,
        claimed: (f64, f64),
        resolved_zone: String,
        device_fingerprint: String,
    ) -> Result<Option<Self>, DbErr> {
        let correlation_key = self_correlation_key(day, seq);
        let row = ActiveModel {
            id: NotSet,
            kind: Set(MarkKind::SelfCheckIn),
            principal_type: Set(principal.kind.clone()),
            principal_id: Set(principal.id),
            exam_id: Set(None),
            subject_id: Set(None),
            lecture_id: Set(None),
            correlation_key: Set(correlation_key.clone()),
            direction: Set(direction),
            recorded_at: Set(recorded_at),
            local_day: Set(Some(day)),
            claimed_lat: Set(Some(claimed.0)),
            claimed_lng: Set(Some(claimed.1)),
            resolved_zone: Set(Some(resolved_zone)),
            device_fingerprint: Set(Some(device_fingerprint)),
            verified: Set(true),
            marked_by: Set(None),
        };

        let inserted = Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    Column::PrincipalType,
                    Column::PrincipalId,
                    Column::CorrelationKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        if inserted == 0 {
            return Ok(None);
        }

        Self::find_by_correlation(db, principal, &correlation_key).await
    }

    pub async fn count_self_marks_for_day(
        db: &DatabaseConnection,
        principal: &Principal,
        day: NaiveDate,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::Kind.eq(MarkKind::SelfCheckIn))
            .filter(Column::PrincipalType.eq(principal.kind.clone()))
            .filter(Column::PrincipalId.eq(principal.id))
            .filter(Column::LocalDay.eq(day))
            .count(db)
            .await
    }

    pub async fn self_marks_for_day(
        db: &DatabaseConnection,
        principal: &Principal,
        day: NaiveDate,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Kind.eq(MarkKind::SelfCheckIn))
            .filter(Column::PrincipalType.eq(principal.kind.clone()))
            .filter(Column::PrincipalId.eq(principal.id))
            .filter(Column::LocalDay.eq(day))
            .order_by_asc(Column::RecordedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn self_marks_between(
        db: &DatabaseConnection,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Kind.eq(MarkKind::SelfCheckIn))
            .filter(Column::PrincipalType.eq(principal.kind.clone()))
            .filter(Column::PrincipalId.eq(principal.id))
            .filter(Column::LocalDay.gte(from))
            .filter(Column::LocalDay.lte(to))
            .order_by_asc(Column::RecordedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use sea_orm::PaginatorTrait;

    fn write_for(principal: Principal, exam_id: i64, subject_id: i64) -> PresenceWrite {
        PresenceWrite {
            kind: MarkKind::Exam,
            principal,
            exam_id: Some(exam_id),
            subject_id: Some(subject_id),
            lecture_id: None,
            correlation_key: exam_correlation_key(exam_id, subject_id),
            recorded_at: Utc::now(),
            marked_by: Some(5),
        }
    }

    #[tokio::test]
    async fn upsert_creates_one_row_then_updates_in_place() {
        let db = setup_test_db().await;
        let principal = Principal::student(100);

        let first = Model::upsert_present(&db, write_for(principal.clone(), 42, 7))
            .await
            .unwrap();
        assert_eq!(first.direction, Direction::Present);

        // Second write for the same (principal, entity) must not add a row.
        let second = Model::upsert_present(&db, write_for(principal.clone(), 42, 7))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let total = Entity::find().count(&db).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn marks_for_different_subjects_are_distinct_rows() {
        let db = setup_test_db().await;
        let principal = Principal::student(100);

        Model::upsert_present(&db, write_for(principal.clone(), 42, 7))
            .await
            .unwrap();
        Model::upsert_present(&db, write_for(principal.clone(), 42, 8))
            .await
            .unwrap();

        let total = Entity::find().count(&db).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn self_append_rejects_duplicate_sequence_slot() {
        let db = setup_test_db().await;
        let principal = Principal::personnel(7);
        let day = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let first = Model::append_self_mark(
            &db,
            &principal,
            day,
            0,
            Direction::Entry,
            Utc::now(),
            (12.9716, 77.5946),
            "main".into(),
            "fp-a".into(),
        )
        .await
        .unwrap();
        assert!(first.is_some());

        // Same (principal, day, seq): the conditional insert affects no rows.
        let duplicate = Model::append_self_mark(
            &db,
            &principal,
            day,
            0,
            Direction::Entry,
            Utc::now(),
            (12.9716, 77.5946),
            "main".into(),
            "fp-a".into(),
        )
        .await
        .unwrap();
        assert!(duplicate.is_none());

        assert_eq!(
            Model::count_self_marks_for_day(&db, &principal, day)
                .await
                .unwrap(),
            1
        );
    }
}
