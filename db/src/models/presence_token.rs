use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One verifiable presence opportunity. The `scope_key` column is unique, so
/// a scope can never hold two currently-valid secrets: lecture rotation is an
/// upsert that replaces the previous secret in the same statement, and exam
/// issuance inserts with `DO NOTHING` so existing tokens stay untouched.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "presence_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: TokenKind,
    pub exam_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub student_id: Option<i64>,
    pub lecture_id: Option<i64>,
    #[sea_orm(unique)]
    pub scope_key: String,
    pub secret: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "presence_token_kind")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TokenKind {
    #[sea_orm(string_value = "exam")]
    Exam,
    #[sea_orm(string_value = "lecture")]
    Lecture,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Canonical scope key for an (exam, subject, student) token.
pub fn exam_scope_key(exam_id: i64, subject_id: i64, student_id: i64) -> String {
    format!("exam:{exam_id}:{subject_id}:{student_id}")
}

/// Canonical scope key for a lecture token.
pub fn lecture_scope_key(lecture_id: i64) -> String {
    format!("lecture:{lecture_id}")
}

impl Model {
    /// Generates a fresh opaque secret: 32 bytes from the OS RNG, hex-encoded.
    pub fn generate_secret() -> String {
        let mut buf = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut buf);
        hex::encode(buf)
    }

    pub async fn find_by_scope_key(
        db: &DatabaseConnection,
        scope_key: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::ScopeKey.eq(scope_key))
            .one(db)
            .await
    }

    /// Issues exam tokens for every (subject, student) pair in one statement.
    ///
    /// Pairs that already hold a token are skipped via `ON CONFLICT DO
    /// NOTHING`, which makes repeated issuance after exam edits safe: only
    /// newly added combinations receive tokens. Returns the number of tokens
    /// actually created.
    pub async fn issue_exam_batch(
        db: &DatabaseConnection,
        exam_id: i64,
        pairs: &[(i64, i64)],
    ) -> Result<u64, DbErr> {
        if pairs.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = pairs.iter().map(|&(subject_id, student_id)| ActiveModel {
            id: NotSet,
            kind: Set(TokenKind::Exam),
            exam_id: Set(Some(exam_id)),
            subject_id: Set(Some(subject_id)),
            student_id: Set(Some(student_id)),
            lecture_id: Set(None),
            scope_key: Set(exam_scope_key(exam_id, subject_id, student_id)),
            secret: Set(Self::generate_secret()),
            issued_at: Set(now),
            expires_at: Set(None),
            revoked: Set(false),
        });

        Entity::insert_many(rows)
            .on_conflict(
                OnConflict::column(Column::ScopeKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await
    }

    /// Rotates the lecture token: a single upsert on `scope_key` replaces the
    /// previous secret and expiry, so the old code is invalid the instant the
    /// new one exists even if its TTL had not elapsed.
    pub async fn rotate_lecture(
        db: &DatabaseConnection,
        lecture_id: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let scope_key = lecture_scope_key(lecture_id);
        let row = ActiveModel {
            id: NotSet,
            kind: Set(TokenKind::Lecture),
            exam_id: Set(None),
            subject_id: Set(None),
            student_id: Set(None),
            lecture_id: Set(Some(lecture_id)),
            scope_key: Set(scope_key.clone()),
            secret: Set(Self::generate_secret()),
            issued_at: Set(now),
            expires_at: Set(Some(now + ttl)),
            revoked: Set(false),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::column(Column::ScopeKey)
                    .update_columns([Column::Secret, Column::IssuedAt, Column::ExpiresAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find_by_scope_key(db, &scope_key)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("presence token {scope_key}")))
    }

    /// Explicitly revokes every token for an exam (used when an exam's codes
    /// must be regenerated); a revoked token fails freshness checks until the
    /// next issuance replaces it.
    pub async fn revoke_for_exam(db: &DatabaseConnection, exam_id: i64) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Revoked, Expr::value(true))
            .filter(Column::Kind.eq(TokenKind::Exam))
            .filter(Column::ExamId.eq(exam_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
