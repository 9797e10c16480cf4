//! Flow calculations: net amount moved per (period, cash-flow activity,
//! account), debits positive.

use num_rational::BigRational;
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, money,
    util::{parse_stored_amount, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowCalculation {
    /// `None` for rows of the trailing unfrozen period.
    pub frozen_period_id: Option<Uuid>,
    pub cash_flow_activity_id: Uuid,
    pub account_id: Uuid,
    pub net_amount: BigRational,
}

impl FlowCalculation {
    /// Active model for storing this row under `frozen_period_id`.
    pub fn to_active_model(&self, frozen_period_id: Uuid) -> ActiveModel {
        ActiveModel {
            frozen_period_id: ActiveValue::Set(frozen_period_id.to_string()),
            cash_flow_activity_id: ActiveValue::Set(self.cash_flow_activity_id.to_string()),
            account_id: ActiveValue::Set(self.account_id.to_string()),
            net_amount: ActiveValue::Set(money::to_stored(&self.net_amount)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flow_calculations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub frozen_period_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub cash_flow_activity_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    pub net_amount: String,
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

impl TryFrom<Model> for FlowCalculation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            frozen_period_id: Some(parse_uuid(&model.frozen_period_id, "frozen period")?),
            cash_flow_activity_id: parse_uuid(&model.cash_flow_activity_id, "cash flow activity")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            net_amount: parse_stored_amount(&model.net_amount, "net amount")?,
        })
    }
}
