//! Accounts.
//!
//! An [`Account`] is denominated in one currency and has a closed
//! [`AccountKind`]. The kind decides on which [`Side`] the account normally
//! carries its balance, whether it tracks item quantities and whether it is
//! emptied by closing entries at the end of a period.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Side of a double-entry posting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Debit,
    Credit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    GeneralAsset,
    LiquidAsset,
    DepreciativeAsset,
    ItemizedAsset,
    Liability,
    Equity,
    Income,
    Expense,
    GeneralTemporary,
    NominalTemporary,
    NominalReturn,
}

impl AccountKind {
    pub const ALL: [AccountKind; 11] = [
        Self::GeneralAsset,
        Self::LiquidAsset,
        Self::DepreciativeAsset,
        Self::ItemizedAsset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
        Self::GeneralTemporary,
        Self::NominalTemporary,
        Self::NominalReturn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralAsset => "general_asset",
            Self::LiquidAsset => "liquid_asset",
            Self::DepreciativeAsset => "depreciative_asset",
            Self::ItemizedAsset => "itemized_asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::GeneralTemporary => "general_temporary",
            Self::NominalTemporary => "nominal_temporary",
            Self::NominalReturn => "nominal_return",
        }
    }

    /// Side on which the account normally carries its balance.
    pub fn normal_side(self) -> Side {
        match self {
            Self::GeneralAsset
            | Self::LiquidAsset
            | Self::DepreciativeAsset
            | Self::ItemizedAsset
            | Self::Expense
            | Self::NominalReturn => Side::Debit,
            Self::Liability
            | Self::Equity
            | Self::Income
            | Self::GeneralTemporary
            | Self::NominalTemporary => Side::Credit,
        }
    }

    pub fn is_asset(self) -> bool {
        matches!(
            self,
            Self::GeneralAsset | Self::LiquidAsset | Self::DepreciativeAsset | Self::ItemizedAsset
        )
    }

    /// Assets that can pay for or receive the proceeds of items.
    pub fn is_cash_like(self) -> bool {
        matches!(self, Self::GeneralAsset | Self::LiquidAsset)
    }

    /// Itemized accounts track quantities next to values.
    pub fn is_itemized(self) -> bool {
        matches!(self, Self::ItemizedAsset)
    }

    /// Nominal accounts are emptied by closing entries.
    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            Self::Income
                | Self::Expense
                | Self::NominalReturn
                | Self::GeneralTemporary
                | Self::NominalTemporary
        )
    }

    /// Accounts where realized gains or losses can emerge.
    pub fn is_gain_or_loss(self) -> bool {
        matches!(self, Self::Income | Self::Expense | Self::NominalReturn)
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EngineError::KeyNotFound(format!("account kind {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub currency_id: Uuid,
    pub kind: AccountKind,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(name: &str, currency_id: Uuid, kind: AccountKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            currency_id,
            kind,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub currency_id: String,
    pub kind: String,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::CurrencyId",
        to = "super::currencies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Currencies,
}

impl Related<super::currencies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currencies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            currency_id: ActiveValue::Set(account.currency_id.to_string()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            deleted_at: ActiveValue::Set(account.deleted_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            name: model.name,
            currency_id: parse_uuid(&model.currency_id, "currency")?,
            kind: AccountKind::try_from(model.kind.as_str())?,
            deleted_at: model.deleted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for kind in AccountKind::ALL {
            assert_eq!(AccountKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountKind::try_from("contra_asset").is_err());
    }

    #[test]
    fn normal_sides_follow_accounting_convention() {
        assert_eq!(AccountKind::LiquidAsset.normal_side(), Side::Debit);
        assert_eq!(AccountKind::Expense.normal_side(), Side::Debit);
        assert_eq!(AccountKind::Liability.normal_side(), Side::Credit);
        assert_eq!(AccountKind::Income.normal_side(), Side::Credit);
        assert!(AccountKind::ItemizedAsset.is_itemized());
        assert!(!AccountKind::Equity.is_nominal());
        assert!(AccountKind::GeneralTemporary.is_nominal());
    }
}
