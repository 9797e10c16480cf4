//! Modifier atoms: the legs of a modifier.
//!
//! An atom only declares a role (account + [`ModifierAtomKind`]); values are
//! carried by the financial entry atoms of each occurrence.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Side,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierAtomKind {
    RealDebit,
    RealCredit,
    Debitem,
    Creditem,
    Emergent,
}

impl ModifierAtomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RealDebit => "real_debit",
            Self::RealCredit => "real_credit",
            Self::Debitem => "debitem",
            Self::Creditem => "creditem",
            Self::Emergent => "emergent",
        }
    }

    /// Designated side of the leg. Emergent legs have none: they take the
    /// side that balances the entry.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::RealDebit | Self::Debitem => Some(Side::Debit),
            Self::RealCredit | Self::Creditem => Some(Side::Credit),
            Self::Emergent => None,
        }
    }

    /// Itemized legs move quantities of an itemized asset.
    pub fn is_itemized(self) -> bool {
        matches!(self, Self::Debitem | Self::Creditem)
    }
}

impl TryFrom<&str> for ModifierAtomKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "real_debit" => Ok(Self::RealDebit),
            "real_credit" => Ok(Self::RealCredit),
            "debitem" => Ok(Self::Debitem),
            "creditem" => Ok(Self::Creditem),
            "emergent" => Ok(Self::Emergent),
            other => Err(EngineError::KeyNotFound(format!("modifier atom kind {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierAtom {
    pub id: Uuid,
    pub modifier_id: Uuid,
    pub account_id: Uuid,
    pub kind: ModifierAtomKind,
    pub cash_flow_activity_id: Option<Uuid>,
}

impl ModifierAtom {
    pub fn new(modifier_id: Uuid, account_id: Uuid, kind: ModifierAtomKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            modifier_id,
            account_id,
            kind,
            cash_flow_activity_id: None,
        }
    }

    #[must_use]
    pub fn with_activity(mut self, cash_flow_activity_id: Uuid) -> Self {
        self.cash_flow_activity_id = Some(cash_flow_activity_id);
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modifier_atoms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub modifier_id: String,
    pub account_id: String,
    pub kind: String,
    pub cash_flow_activity_id: Option<String>,
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
}

impl Related<super::modifiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modifiers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ModifierAtom> for ActiveModel {
    fn from(atom: &ModifierAtom) -> Self {
        Self {
            id: ActiveValue::Set(atom.id.to_string()),
            modifier_id: ActiveValue::Set(atom.modifier_id.to_string()),
            account_id: ActiveValue::Set(atom.account_id.to_string()),
            kind: ActiveValue::Set(atom.kind.as_str().to_string()),
            cash_flow_activity_id: ActiveValue::Set(
                atom.cash_flow_activity_id.map(|id| id.to_string()),
            ),
        }
    }
}

impl TryFrom<Model> for ModifierAtom {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "modifier atom")?,
            modifier_id: parse_uuid(&model.modifier_id, "modifier")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: ModifierAtomKind::try_from(model.kind.as_str())?,
            cash_flow_activity_id: parse_optional_uuid(
                model.cash_flow_activity_id.as_deref(),
                "cash flow activity",
            )?,
        })
    }
}
