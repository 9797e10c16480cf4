//! The data-access contract of the engine.
//!
//! The engine never builds queries itself: everything it reads comes through
//! a [`LedgerSource`]. Calls are synchronous and are not retried; a failure
//! propagates to the caller as is. Unknown ids are simply absent from the
//! returned rows.
//!
//! [`LedgerSnapshot`](crate::LedgerSnapshot) is the in-memory implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Account, AccountKind, CashFlowActivity, Collection, Currency, ExchangeRateInfo,
    FinancialEntry, FinancialEntryAtom, FlowCalculation, Modifier, ModifierAction, ModifierAtom,
    ResultEngine, SummaryCalculation,
};

/// Rows of a period computed on demand instead of being read from storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPeriodData {
    pub cash_flow_activities: Vec<CashFlowActivity>,
    pub accounts: Vec<Account>,
    pub summaries: Vec<SummaryCalculation>,
    pub flows: Vec<FlowCalculation>,
    pub exchange_observations: Vec<ExchangeRateInfo>,
}

pub trait LedgerSource {
    fn currencies(&self, ids: &[Uuid]) -> ResultEngine<Vec<Currency>>;

    fn accounts(&self, ids: &[Uuid]) -> ResultEngine<Vec<Account>>;

    fn accounts_by_kinds(&self, kinds: &[AccountKind]) -> ResultEngine<Vec<Account>>;

    fn collections(&self, ids: &[Uuid]) -> ResultEngine<Vec<Collection>>;

    fn collection_account_ids(&self, collection_id: Uuid) -> ResultEngine<Vec<Uuid>>;

    fn modifiers(&self, ids: &[Uuid]) -> ResultEngine<Vec<Modifier>>;

    fn modifiers_by_action(&self, action: ModifierAction) -> ResultEngine<Vec<Modifier>>;

    /// Atoms of one modifier.
    fn modifier_atoms(&self, modifier_id: Uuid) -> ResultEngine<Vec<ModifierAtom>>;

    /// Entries of the given modifiers transacted at or before `until`, in
    /// chronological order.
    fn financial_entries(
        &self,
        modifier_ids: &[Uuid],
        until: DateTime<Utc>,
    ) -> ResultEngine<Vec<FinancialEntry>>;

    fn financial_entry_atoms(&self, entry_ids: &[Uuid]) -> ResultEngine<Vec<FinancialEntryAtom>>;

    fn summary_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<SummaryCalculation>>;

    fn flow_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<FlowCalculation>>;

    /// Computes the rows of `[start, end)` from the entries themselves.
    fn compute_raw_period_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ResultEngine<RawPeriodData>;
}
