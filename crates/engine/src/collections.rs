//! Collections group accounts for reporting (`COLLECTION[<id>]` in formulas).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub user_id: String,
}

impl Collection {
    pub fn new(name: &str, user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "collections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_collections::Entity")]
    AccountCollections,
}

impl Related<super::account_collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountCollections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Collection> for ActiveModel {
    fn from(collection: &Collection) -> Self {
        Self {
            id: ActiveValue::Set(collection.id.to_string()),
            name: ActiveValue::Set(collection.name.clone()),
            user_id: ActiveValue::Set(collection.user_id.clone()),
        }
    }
}

impl TryFrom<Model> for Collection {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "collection")?,
            name: model.name,
            user_id: model.user_id,
        })
    }
}
