use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Read-only mirror of the portal's student identity registry, used to put a
/// display name on scan confirmations. Ids are assigned by the portal.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub full_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Test-fixture insert; production rows arrive via the portal.
    pub async fn create(db: &DatabaseConnection, id: i64, full_name: &str) -> Result<Self, DbErr> {
        ActiveModel {
            id: Set(id),
            full_name: Set(full_name.to_owned()),
        }
        .insert(db)
        .await
    }

    pub async fn display_name(db: &DatabaseConnection, id: i64) -> Result<Option<String>, DbErr> {
        Ok(Entity::find_by_id(id).one(db).await?.map(|s| s.full_name))
    }
}
