//! Handles settings for the engine. Configuration is read from an optional
//! file (e.g. `engine.toml`) and from `ENGINE_*` environment variables,
//! falling back to defaults.
//!
//! ```toml
//! exchange_rate_cutoff = "2024-12-31T23:59:59Z"
//! unreachable_currency = "skip"
//! default_scale = 12
//! ```

use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{ResultEngine, currencies::DEFAULT_SCALE};

/// What to do with an account whose currency cannot be converted into the
/// report currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableCurrencyPolicy {
    /// Fail the aggregation with `MissingExchangeRate`.
    #[default]
    Abort,
    /// Let the account contribute zero.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Last moment whose exchange observations may be used by any report.
    pub exchange_rate_cutoff: Option<DateTime<Utc>>,
    pub unreachable_currency: UnreachableCurrencyPolicy,
    /// Presentational scale of currencies without precision settings.
    pub default_scale: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            exchange_rate_cutoff: None,
            unreachable_currency: UnreachableCurrencyPolicy::default(),
            default_scale: DEFAULT_SCALE,
        }
    }
}

impl EngineSettings {
    /// Loads settings from `path` (any format supported by `config`, the file
    /// is optional) and `ENGINE_*` environment variables.
    pub fn load(path: &str) -> ResultEngine<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ENGINE"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Effective cutoff for a report whose last time group finishes at
    /// `latest`.
    pub fn cutoff_for(&self, latest: DateTime<Utc>) -> DateTime<Utc> {
        match self.exchange_rate_cutoff {
            Some(cutoff) if cutoff < latest => cutoff,
            _ => latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = EngineSettings::load("does-not-exist/engine").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.default_scale, 12);
        assert_eq!(settings.unreachable_currency, UnreachableCurrencyPolicy::Abort);
    }

    #[test]
    fn cutoff_never_exceeds_configured_value() {
        let configured = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let settings = EngineSettings {
            exchange_rate_cutoff: Some(configured),
            ..EngineSettings::default()
        };
        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(settings.cutoff_for(later), configured);
        assert_eq!(settings.cutoff_for(earlier), earlier);
        assert_eq!(EngineSettings::default().cutoff_for(later), later);
    }
}
