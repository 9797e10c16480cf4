//! Many-to-many link between collections and accounts.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountCollection {
    pub collection_id: Uuid,
    pub account_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_collections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collections::Entity",
        from = "Column::CollectionId",
        to = "super::collections::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Collections,
}

impl Related<super::collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AccountCollection> for ActiveModel {
    fn from(link: &AccountCollection) -> Self {
        Self {
            collection_id: ActiveValue::Set(link.collection_id.to_string()),
            account_id: ActiveValue::Set(link.account_id.to_string()),
        }
    }
}

impl TryFrom<Model> for AccountCollection {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            collection_id: parse_uuid(&model.collection_id, "collection")?,
            account_id: parse_uuid(&model.account_id, "account")?,
        })
    }
}
