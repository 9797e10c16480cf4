//! Financial entries: dated occurrences of a modifier.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: Uuid,
    pub modifier_id: Uuid,
    pub transacted_at: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl FinancialEntry {
    pub fn new(modifier_id: Uuid, transacted_at: DateTime<Utc>, remarks: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            modifier_id,
            transacted_at,
            remarks: remarks
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub modifier_id: String,
    pub transacted_at: DateTimeUtc,
    pub remarks: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::modifiers::Entity",
        from = "Column::ModifierId",
        to = "super::modifiers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Modifiers,
    #[sea_orm(has_many = "super::financial_entry_atoms::Entity")]
    FinancialEntryAtoms,
}

impl Related<super::modifiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modifiers.def()
    }
}

impl Related<super::financial_entry_atoms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialEntryAtoms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FinancialEntry> for ActiveModel {
    fn from(entry: &FinancialEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            modifier_id: ActiveValue::Set(entry.modifier_id.to_string()),
            transacted_at: ActiveValue::Set(entry.transacted_at),
            remarks: ActiveValue::Set(entry.remarks.clone()),
        }
    }
}

impl TryFrom<Model> for FinancialEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "financial entry")?,
            modifier_id: parse_uuid(&model.modifier_id, "modifier")?,
            transacted_at: model.transacted_at,
            remarks: model.remarks,
        })
    }
}
