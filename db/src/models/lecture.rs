use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Read-only mirror of the portal's lecture registry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "lectures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub subject_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Test-fixture insert; production rows arrive via the portal.
    pub async fn create(
        db: &DatabaseConnection,
        subject_id: i64,
        title: &str,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            subject_id: Set(subject_id),
            title: Set(title.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    pub async fn exists(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id(id).one(db).await?.is_some())
    }
}
