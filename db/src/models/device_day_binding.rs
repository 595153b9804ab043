use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use serde::Serialize;

use super::attendance_mark::{Principal, PrincipalType};

/// Daily 1:1 association between a principal and the device used for
/// self-check-in. One row per (principal, calendar day), enforced by a unique
/// index; written once on the first mark of the day, read-only afterwards,
/// never carried across days.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "device_day_bindings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub principal_type: PrincipalType,
    pub principal_id: i64,
    pub day: Date,
    pub fingerprint: String,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for_day(
        db: &DatabaseConnection,
        principal: &Principal,
        day: Date,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::PrincipalType.eq(principal.kind.clone()))
            .filter(Column::PrincipalId.eq(principal.id))
            .filter(Column::Day.eq(day))
            .one(db)
            .await
    }

    /// Binds `fingerprint` to (principal, day) if the day has no binding yet,
    /// then returns whichever binding won. First-writer-wins: the insert is
    /// conditional on the unique index, so two racing first check-ins agree
    /// on a single binding and the loser simply reads it back.
    pub async fn bind_or_get(
        db: &DatabaseConnection,
        principal: &Principal,
        day: Date,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let row = ActiveModel {
            id: NotSet,
            principal_type: Set(principal.kind.clone()),
            principal_id: Set(principal.id),
            day: Set(day),
            fingerprint: Set(fingerprint.to_owned()),
            first_seen_at: Set(now),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::columns([Column::PrincipalType, Column::PrincipalId, Column::Day])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find_for_day(db, principal, day)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!(
                    "device binding for principal {} on {day}",
                    principal.id
                ))
            })
    }
}
