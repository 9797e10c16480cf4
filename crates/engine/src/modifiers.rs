//! Modifiers.
//!
//! A [`Modifier`] is a named transaction template. Its [`ModifierAction`]
//! decides which leg shapes are legal (see
//! [`ModifierAtomInputExaminer`](crate::ModifierAtomInputExaminer)) and how
//! its financial entries are read: `Exchange` entries are exchange-rate
//! observations, `Close` entries only move the *closed* stage.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierAction {
    Record,
    Bid,
    Ask,
    Exchange,
    Dilute,
    Condense,
    Close,
}

impl ModifierAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Bid => "bid",
            Self::Ask => "ask",
            Self::Exchange => "exchange",
            Self::Dilute => "dilute",
            Self::Condense => "condense",
            Self::Close => "close",
        }
    }
}

impl TryFrom<&str> for ModifierAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "record" => Ok(Self::Record),
            "bid" => Ok(Self::Bid),
            "ask" => Ok(Self::Ask),
            "exchange" => Ok(Self::Exchange),
            "dilute" => Ok(Self::Dilute),
            "condense" => Ok(Self::Condense),
            "close" => Ok(Self::Close),
            other => Err(EngineError::KeyNotFound(format!("modifier action {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Manual,
    Automated,
}

impl ModifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automated => "automated",
        }
    }
}

impl TryFrom<&str> for ModifierKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "automated" => Ok(Self::Automated),
            other => Err(EngineError::KeyNotFound(format!("modifier kind {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: Uuid,
    pub name: String,
    pub action: ModifierAction,
    pub kind: ModifierKind,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Modifier {
    pub fn new(name: &str, action: ModifierAction, kind: ModifierKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            action,
            kind,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modifiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub action: String,
    pub kind: String,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::modifier_atoms::Entity")]
    ModifierAtoms,
    #[sea_orm(has_many = "super::financial_entries::Entity")]
    FinancialEntries,
}

impl Related<super::modifier_atoms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModifierAtoms.def()
    }
}

impl Related<super::financial_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Modifier> for ActiveModel {
    fn from(modifier: &Modifier) -> Self {
        Self {
            id: ActiveValue::Set(modifier.id.to_string()),
            name: ActiveValue::Set(modifier.name.clone()),
            action: ActiveValue::Set(modifier.action.as_str().to_string()),
            kind: ActiveValue::Set(modifier.kind.as_str().to_string()),
            deleted_at: ActiveValue::Set(modifier.deleted_at),
        }
    }
}

impl TryFrom<Model> for Modifier {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "modifier")?,
            name: model.name,
            action: ModifierAction::try_from(model.action.as_str())?,
            kind: ModifierKind::try_from(model.kind.as_str())?,
            deleted_at: model.deleted_at,
        })
    }
}
