//! Calculation core of a double-entry bookkeeping ledger.
//!
//! - [`TimeGroupManager`] aggregates per-account stage totals over frozen
//!   periods and the trailing unfrozen one, normalized into one currency
//!   with rates derived by [`ExchangeRateCache`].
//! - [`MathExpression`] evaluates report formulas over those totals.
//! - [`ModifierAtomInputExaminer`] and [`FinancialEntryAtomInputExaminer`]
//!   validate proposed ledger writes.
//!
//! Every component reads through a request-scoped [`ReportContext`] over a
//! [`LedgerSource`]; [`LedgerStore`] loads one from the database.

pub use account_collections::AccountCollection;
pub use accounts::{Account, AccountKind, Side};
pub use cash_flow_activities::CashFlowActivity;
pub use collections::Collection;
pub use context::ReportContext;
pub use currencies::{Currency, CurrencyPrecision, DEFAULT_SCALE};
pub use error::{EngineError, ExpressionError, ExpressionErrorKind};
pub use examiners::{
    FinancialEntryAtomInput, FinancialEntryAtomInputExaminer, ModifierAtomInput,
    ModifierAtomInputExaminer,
};
pub use exchange::{ExchangeRateCache, ExchangeRateDerivator, ExchangeRateInfo};
pub use expression::MathExpression;
pub use financial_entries::FinancialEntry;
pub use financial_entry_atoms::{AtomValues, EntryAtomValueKind, FinancialEntryAtom};
pub use flow_calculations::FlowCalculation;
pub use frozen_periods::FrozenPeriod;
pub use legs::Leg;
pub use modifier_atoms::{ModifierAtom, ModifierAtomKind};
pub use modifiers::{Modifier, ModifierAction, ModifierKind};
pub use settings::{EngineSettings, UnreachableCurrencyPolicy};
pub use snapshot::LedgerSnapshot;
pub use source::{LedgerSource, RawPeriodData};
pub use store::{LedgerStore, LedgerStoreBuilder};
pub use summary_calculations::{Stage, SummaryCalculation};
pub use time_group::{PeriodicTimeGroup, TimeGroup, TimeGroupManager, UnfrozenTimeGroup};

mod account_collections;
mod accounts;
pub mod calculation;
mod cash_flow_activities;
mod collections;
mod context;
mod currencies;
mod error;
mod examiners;
mod exchange;
pub mod expression;
mod financial_entries;
mod financial_entry_atoms;
mod flow_calculations;
mod frozen_periods;
mod legs;
mod modifier_atoms;
mod modifiers;
pub mod money;
mod settings;
mod snapshot;
mod source;
mod store;
mod summary_calculations;
mod time_group;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
