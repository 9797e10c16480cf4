//! Currencies.
//!
//! A [`Currency`] only matters at the presentation boundary: the engine keeps
//! amounts as exact rationals and rounds them to the currency's maximum
//! presentational scale when they are formatted.
//!
//! ```rust
//! use engine::Currency;
//! use engine::money::parse_amount;
//!
//! let eur = Currency::new("EUR").with_precision(2, 2);
//! assert_eq!(eur.format(&parse_amount("10.125").unwrap(), 12), "10.12");
//! ```

use num_rational::BigRational;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, money,
    util::{parse_scale, parse_uuid},
};

/// Default presentational scale of a currency without precision settings.
pub const DEFAULT_SCALE: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPrecision {
    pub minimum_scale: u32,
    pub maximum_scale: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: Uuid,
    pub code: String,
    pub precision: Option<CurrencyPrecision>,
}

impl Currency {
    pub fn new(code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.trim().to_ascii_uppercase(),
            precision: None,
        }
    }

    #[must_use]
    pub fn with_precision(mut self, minimum_scale: u32, maximum_scale: u32) -> Self {
        self.precision = Some(CurrencyPrecision {
            minimum_scale: minimum_scale.min(maximum_scale),
            maximum_scale,
        });
        self
    }

    /// Formats `value` at this currency's maximum presentational scale,
    /// rounding half to even. Without precision settings `default_scale` is
    /// used for both bounds.
    pub fn format(&self, value: &BigRational, default_scale: u32) -> String {
        match self.precision {
            Some(precision) => {
                money::format_amount(value, precision.minimum_scale, precision.maximum_scale)
            }
            None => money::format_amount(value, default_scale, default_scale),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub minimum_scale: Option<i32>,
    pub maximum_scale: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Currency> for ActiveModel {
    fn from(currency: &Currency) -> Self {
        let (minimum_scale, maximum_scale) = match currency.precision {
            Some(precision) => (
                Some(precision.minimum_scale as i32),
                Some(precision.maximum_scale as i32),
            ),
            None => (None, None),
        };
        Self {
            id: ActiveValue::Set(currency.id.to_string()),
            code: ActiveValue::Set(currency.code.clone()),
            minimum_scale: ActiveValue::Set(minimum_scale),
            maximum_scale: ActiveValue::Set(maximum_scale),
        }
    }
}

impl TryFrom<Model> for Currency {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let precision = match (model.minimum_scale, model.maximum_scale) {
            (Some(minimum), Some(maximum)) => Some(CurrencyPrecision {
                minimum_scale: parse_scale(minimum, "minimum scale")?,
                maximum_scale: parse_scale(maximum, "maximum scale")?,
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "currency")?,
            code: model.code,
            precision,
        })
    }
}
