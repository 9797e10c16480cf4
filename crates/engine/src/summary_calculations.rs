//! Summary calculations.
//!
//! One row per (period, account) with the account's netted position at the
//! three [`Stage`]s of the period:
//!
//! - **opened**: everything posted before the period started;
//! - **unadjusted**: opened plus the period's postings, closing entries
//!   excluded;
//! - **closed**: unadjusted plus the period's closing entries.
//!
//! A positive net (debits minus credits) is reported on the debit side, a
//! negative one on the credit side. The closed amounts of a period are the
//! opened amounts of the next contiguous one.

use num_rational::BigRational;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Side, money,
    util::{parse_stored_amount, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Opened,
    Unadjusted,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryCalculation {
    /// `None` for rows of the trailing unfrozen period.
    pub frozen_period_id: Option<Uuid>,
    pub account_id: Uuid,
    pub opened_debit_amount: BigRational,
    pub opened_credit_amount: BigRational,
    pub unadjusted_debit_amount: BigRational,
    pub unadjusted_credit_amount: BigRational,
    pub closed_debit_amount: BigRational,
    pub closed_credit_amount: BigRational,
}

impl SummaryCalculation {
    /// Builds a row from the net positions at each stage.
    pub fn from_nets(
        frozen_period_id: Option<Uuid>,
        account_id: Uuid,
        opened: &BigRational,
        unadjusted: &BigRational,
        closed: &BigRational,
    ) -> Self {
        let (opened_debit_amount, opened_credit_amount) = money::split_net(opened);
        let (unadjusted_debit_amount, unadjusted_credit_amount) = money::split_net(unadjusted);
        let (closed_debit_amount, closed_credit_amount) = money::split_net(closed);
        Self {
            frozen_period_id,
            account_id,
            opened_debit_amount,
            opened_credit_amount,
            unadjusted_debit_amount,
            unadjusted_credit_amount,
            closed_debit_amount,
            closed_credit_amount,
        }
    }

    pub fn amount(&self, stage: Stage, side: Side) -> &BigRational {
        match (stage, side) {
            (Stage::Opened, Side::Debit) => &self.opened_debit_amount,
            (Stage::Opened, Side::Credit) => &self.opened_credit_amount,
            (Stage::Unadjusted, Side::Debit) => &self.unadjusted_debit_amount,
            (Stage::Unadjusted, Side::Credit) => &self.unadjusted_credit_amount,
            (Stage::Closed, Side::Debit) => &self.closed_debit_amount,
            (Stage::Closed, Side::Credit) => &self.closed_credit_amount,
        }
    }

    /// Active model for storing this row under `frozen_period_id`.
    pub fn to_active_model(&self, frozen_period_id: Uuid) -> ActiveModel {
        ActiveModel {
            frozen_period_id: ActiveValue::Set(frozen_period_id.to_string()),
            account_id: ActiveValue::Set(self.account_id.to_string()),
            opened_debit_amount: ActiveValue::Set(money::to_stored(&self.opened_debit_amount)),
            opened_credit_amount: ActiveValue::Set(money::to_stored(&self.opened_credit_amount)),
            unadjusted_debit_amount: ActiveValue::Set(money::to_stored(
                &self.unadjusted_debit_amount,
            )),
            unadjusted_credit_amount: ActiveValue::Set(money::to_stored(
                &self.unadjusted_credit_amount,
            )),
            closed_debit_amount: ActiveValue::Set(money::to_stored(&self.closed_debit_amount)),
            closed_credit_amount: ActiveValue::Set(money::to_stored(&self.closed_credit_amount)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "summary_calculations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub frozen_period_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    pub opened_debit_amount: String,
    pub opened_credit_amount: String,
    pub unadjusted_debit_amount: String,
    pub unadjusted_credit_amount: String,
    pub closed_debit_amount: String,
    pub closed_credit_amount: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::frozen_periods::Entity",
        from = "Column::FrozenPeriodId",
        to = "super::frozen_periods::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FrozenPeriods,
}

impl Related<super::frozen_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FrozenPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for SummaryCalculation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            frozen_period_id: Some(parse_uuid(&model.frozen_period_id, "frozen period")?),
            account_id: parse_uuid(&model.account_id, "account")?,
            opened_debit_amount: parse_stored_amount(&model.opened_debit_amount, "amount")?,
            opened_credit_amount: parse_stored_amount(&model.opened_credit_amount, "amount")?,
            unadjusted_debit_amount: parse_stored_amount(&model.unadjusted_debit_amount, "amount")?,
            unadjusted_credit_amount: parse_stored_amount(
                &model.unadjusted_credit_amount,
                "amount",
            )?,
            closed_debit_amount: parse_stored_amount(&model.closed_debit_amount, "amount")?,
            closed_credit_amount: parse_stored_amount(&model.closed_credit_amount, "amount")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;

    fn value(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn nets_are_split_per_stage() {
        let row = SummaryCalculation::from_nets(
            None,
            Uuid::new_v4(),
            &value(100),
            &value(-40),
            &value(0),
        );
        assert_eq!(row.amount(Stage::Opened, Side::Debit), &value(100));
        assert_eq!(row.amount(Stage::Opened, Side::Credit), &value(0));
        assert_eq!(row.amount(Stage::Unadjusted, Side::Debit), &value(0));
        assert_eq!(row.amount(Stage::Unadjusted, Side::Credit), &value(40));
        assert_eq!(row.amount(Stage::Closed, Side::Debit), &value(0));
        assert_eq!(row.amount(Stage::Closed, Side::Credit), &value(0));
    }
}
