//! Cash-flow activities (operating, investing, financing, ...) used to
//! classify flow calculations.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowActivity {
    pub id: Uuid,
    pub name: String,
}

impl CashFlowActivity {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_flow_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashFlowActivity> for ActiveModel {
    fn from(activity: &CashFlowActivity) -> Self {
        Self {
            id: ActiveValue::Set(activity.id.to_string()),
            name: ActiveValue::Set(activity.name.clone()),
        }
    }
}

impl TryFrom<Model> for CashFlowActivity {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "cash flow activity")?,
            name: model.name,
        })
    }
}
