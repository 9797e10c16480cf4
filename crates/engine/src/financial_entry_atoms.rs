//! Financial entry atoms: the submitted values of one entry's legs.
//!
//! Several value kinds may coexist for the same modifier atom. A leg's total
//! is either given directly or derived as `price × quantity`, exactly.

use num_rational::BigRational;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, money,
    util::{parse_stored_amount, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAtomValueKind {
    Total,
    Price,
    Quantity,
}

impl EntryAtomValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Price => "price",
            Self::Quantity => "quantity",
        }
    }
}

impl TryFrom<&str> for EntryAtomValueKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "total" => Ok(Self::Total),
            "price" => Ok(Self::Price),
            "quantity" => Ok(Self::Quantity),
            other => Err(EngineError::KeyNotFound(format!("atom value kind {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinancialEntryAtom {
    pub id: Uuid,
    pub financial_entry_id: Uuid,
    pub modifier_atom_id: Uuid,
    pub kind: EntryAtomValueKind,
    pub numerical_value: BigRational,
}

impl FinancialEntryAtom {
    pub fn new(
        financial_entry_id: Uuid,
        modifier_atom_id: Uuid,
        kind: EntryAtomValueKind,
        numerical_value: BigRational,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            financial_entry_id,
            modifier_atom_id,
            kind,
            numerical_value,
        }
    }
}

/// Values submitted for one leg, grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtomValues {
    pub total: Option<BigRational>,
    pub price: Option<BigRational>,
    pub quantity: Option<BigRational>,
}

impl AtomValues {
    /// Stores `value` under `kind`; returns `false` if the kind was already
    /// present.
    pub fn insert(&mut self, kind: EntryAtomValueKind, value: BigRational) -> bool {
        let slot = match kind {
            EntryAtomValueKind::Total => &mut self.total,
            EntryAtomValueKind::Price => &mut self.price,
            EntryAtomValueKind::Quantity => &mut self.quantity,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// The `price × quantity` product, when both are present.
    pub fn derived_total(&self) -> Option<BigRational> {
        match (&self.price, &self.quantity) {
            (Some(price), Some(quantity)) => Some(price * quantity),
            _ => None,
        }
    }

    /// Direct total, else the derived one.
    pub fn resolved_total(&self) -> Option<BigRational> {
        self.total.clone().or_else(|| self.derived_total())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_entry_atoms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub financial_entry_id: String,
    pub modifier_atom_id: String,
    pub kind: String,
    pub numerical_value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financial_entries::Entity",
        from = "Column::FinancialEntryId",
        to = "super::financial_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FinancialEntries,
}

impl Related<super::financial_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FinancialEntryAtom> for ActiveModel {
    fn from(atom: &FinancialEntryAtom) -> Self {
        Self {
            id: ActiveValue::Set(atom.id.to_string()),
            financial_entry_id: ActiveValue::Set(atom.financial_entry_id.to_string()),
            modifier_atom_id: ActiveValue::Set(atom.modifier_atom_id.to_string()),
            kind: ActiveValue::Set(atom.kind.as_str().to_string()),
            numerical_value: ActiveValue::Set(money::to_stored(&atom.numerical_value)),
        }
    }
}

impl TryFrom<Model> for FinancialEntryAtom {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "financial entry atom")?,
            financial_entry_id: parse_uuid(&model.financial_entry_id, "financial entry")?,
            modifier_atom_id: parse_uuid(&model.modifier_atom_id, "modifier atom")?,
            kind: EntryAtomValueKind::try_from(model.kind.as_str())?,
            numerical_value: parse_stored_amount(&model.numerical_value, "numerical value")?,
        })
    }
}
