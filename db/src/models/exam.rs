use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Read-only mirror of the portal's exam registry. The presence core only
/// consults it (existence checks, date-mode scan derivation); rows are owned
/// and written by the surrounding portal.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub scheduled_on: Date,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Test-fixture insert; production rows arrive via the portal.
    pub async fn create(
        db: &DatabaseConnection,
        title: &str,
        scheduled_on: Date,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            title: Set(title.to_owned()),
            scheduled_on: Set(scheduled_on),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    pub async fn exists(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id(id).one(db).await?.is_some())
    }

    /// Ids of every exam scheduled on the given date (date-mode scanning).
    pub async fn ids_scheduled_on(
        db: &DatabaseConnection,
        date: Date,
    ) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::ScheduledOn.eq(date))
            .all(db)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect())
    }
}
