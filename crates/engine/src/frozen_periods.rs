//! Frozen periods: closed `[started_at, finished_at)` ranges whose summary
//! and flow rows are computed once and stored.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrozenPeriod {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FrozenPeriod {
    pub fn new(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> ResultEngine<Self> {
        if started_at >= finished_at {
            return Err(EngineError::InvalidPeriod(format!(
                "period must start before it finishes ({started_at} >= {finished_at})"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            started_at,
            finished_at,
        })
    }

    /// New period `[started_at, finished_at)` following `latest`, which must
    /// finish exactly when the new one starts.
    pub fn next_after(
        latest: Option<&FrozenPeriod>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if let Some(latest) = latest
            && latest.finished_at != started_at
        {
            return Err(EngineError::InvalidPeriod(format!(
                "period must start at {} to follow the latest frozen period",
                latest.finished_at
            )));
        }
        Self::new(started_at, finished_at)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.started_at <= at && at < self.finished_at
    }

    /// Fails when an entry transacted at `at` would land in a period already
    /// frozen, `latest` being the last one.
    pub fn ensure_unfrozen(latest: Option<&FrozenPeriod>, at: DateTime<Utc>) -> ResultEngine<()> {
        match latest {
            Some(latest) if at < latest.finished_at => Err(EngineError::InvalidPeriod(format!(
                "{at} falls before the end of the latest frozen period ({})",
                latest.finished_at
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "frozen_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub started_at: DateTimeUtc,
    pub finished_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::summary_calculations::Entity")]
    SummaryCalculations,
    #[sea_orm(has_many = "super::flow_calculations::Entity")]
    FlowCalculations,
}

impl Related<super::summary_calculations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SummaryCalculations.def()
    }
}

impl Related<super::flow_calculations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowCalculations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FrozenPeriod> for ActiveModel {
    fn from(period: &FrozenPeriod) -> Self {
        Self {
            id: ActiveValue::Set(period.id.to_string()),
            started_at: ActiveValue::Set(period.started_at),
            finished_at: ActiveValue::Set(period.finished_at),
        }
    }
}

impl TryFrom<Model> for FrozenPeriod {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "frozen period")?,
            started_at: model.started_at,
            finished_at: model.finished_at,
        })
    }
}
