//! In-memory ledger.
//!
//! [`LedgerSnapshot`] holds every ledger row in memory and implements
//! [`LedgerSource`] over them. [`LedgerStore`](crate::LedgerStore) loads one
//! from the database; tests build one directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Account, AccountCollection, AccountKind, CashFlowActivity, Collection, Currency,
    FinancialEntry, FinancialEntryAtom, FlowCalculation, FrozenPeriod, LedgerSource, Modifier,
    ModifierAction, ModifierAtom, RawPeriodData, ResultEngine, SummaryCalculation, TimeGroup,
    calculation,
};

#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    pub(crate) currencies: BTreeMap<Uuid, Currency>,
    pub(crate) accounts: BTreeMap<Uuid, Account>,
    pub(crate) collections: BTreeMap<Uuid, Collection>,
    pub(crate) account_collections: Vec<AccountCollection>,
    pub(crate) cash_flow_activities: BTreeMap<Uuid, CashFlowActivity>,
    pub(crate) modifiers: BTreeMap<Uuid, Modifier>,
    pub(crate) modifier_atoms: Vec<ModifierAtom>,
    pub(crate) financial_entries: Vec<FinancialEntry>,
    pub(crate) financial_entry_atoms: Vec<FinancialEntryAtom>,
    pub(crate) frozen_periods: Vec<FrozenPeriod>,
    pub(crate) summaries: Vec<SummaryCalculation>,
    pub(crate) flows: Vec<FlowCalculation>,
}

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_currency(&mut self, currency: Currency) {
        self.currencies.insert(currency.id, currency);
    }

    pub fn add_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    pub fn add_collection(&mut self, collection: Collection, account_ids: &[Uuid]) {
        for account_id in account_ids {
            self.account_collections.push(AccountCollection {
                collection_id: collection.id,
                account_id: *account_id,
            });
        }
        self.collections.insert(collection.id, collection);
    }

    pub fn add_cash_flow_activity(&mut self, activity: CashFlowActivity) {
        self.cash_flow_activities.insert(activity.id, activity);
    }

    /// Adds a modifier with its atoms, in order.
    pub fn add_modifier(&mut self, modifier: Modifier, atoms: Vec<ModifierAtom>) {
        self.modifier_atoms.extend(atoms);
        self.modifiers.insert(modifier.id, modifier);
    }

    /// Adds an entry with its values. Entries dated inside a frozen period
    /// are rejected with `InvalidPeriod`.
    pub fn add_financial_entry(
        &mut self,
        entry: FinancialEntry,
        atoms: Vec<FinancialEntryAtom>,
    ) -> ResultEngine<()> {
        FrozenPeriod::ensure_unfrozen(self.latest_frozen_period(), entry.transacted_at)?;
        self.financial_entry_atoms.extend(atoms);
        self.financial_entries.push(entry);
        Ok(())
    }

    /// Adds a frozen period with rows computed elsewhere.
    pub fn add_frozen_period(
        &mut self,
        period: FrozenPeriod,
        summaries: Vec<SummaryCalculation>,
        flows: Vec<FlowCalculation>,
    ) {
        self.summaries.extend(summaries);
        self.flows.extend(flows);
        self.frozen_periods.push(period);
    }

    /// Freezes `[started_at, finished_at)` right after the latest frozen
    /// period, computing and keeping its rows.
    pub fn freeze(
        &mut self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> ResultEngine<FrozenPeriod> {
        let (period, summaries, flows) = self.prepare_freeze(started_at, finished_at)?;
        self.add_frozen_period(period, summaries, flows);
        Ok(period)
    }

    /// The period to freeze next and its rows, without keeping them.
    pub fn prepare_freeze(
        &self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> ResultEngine<(FrozenPeriod, Vec<SummaryCalculation>, Vec<FlowCalculation>)> {
        let period = FrozenPeriod::next_after(self.latest_frozen_period(), started_at, finished_at)?;
        let raw = calculation::compute_period(self, started_at, finished_at)?;
        let summaries = raw
            .summaries
            .into_iter()
            .map(|row| SummaryCalculation {
                frozen_period_id: Some(period.id),
                ..row
            })
            .collect();
        let flows = raw
            .flows
            .into_iter()
            .map(|row| FlowCalculation {
                frozen_period_id: Some(period.id),
                ..row
            })
            .collect();
        Ok((period, summaries, flows))
    }

    /// Frozen periods in chronological order.
    pub fn frozen_periods(&self) -> Vec<FrozenPeriod> {
        let mut periods = self.frozen_periods.clone();
        periods.sort_by_key(|period| period.started_at);
        periods
    }

    pub fn latest_frozen_period(&self) -> Option<&FrozenPeriod> {
        self.frozen_periods
            .iter()
            .max_by_key(|period| period.finished_at)
    }

    /// Time groups of a report running at `now`.
    pub fn time_groups(&self, now: DateTime<Utc>) -> Vec<TimeGroup> {
        TimeGroup::layout(self.frozen_periods.clone(), now)
    }
}

impl LedgerSource for LedgerSnapshot {
    fn currencies(&self, ids: &[Uuid]) -> ResultEngine<Vec<Currency>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.currencies.get(id).cloned())
            .collect())
    }

    fn accounts(&self, ids: &[Uuid]) -> ResultEngine<Vec<Account>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.accounts.get(id).cloned())
            .collect())
    }

    fn accounts_by_kinds(&self, kinds: &[AccountKind]) -> ResultEngine<Vec<Account>> {
        Ok(self
            .accounts
            .values()
            .filter(|account| kinds.contains(&account.kind))
            .cloned()
            .collect())
    }

    fn collections(&self, ids: &[Uuid]) -> ResultEngine<Vec<Collection>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.collections.get(id).cloned())
            .collect())
    }

    fn collection_account_ids(&self, collection_id: Uuid) -> ResultEngine<Vec<Uuid>> {
        Ok(self
            .account_collections
            .iter()
            .filter(|link| link.collection_id == collection_id)
            .map(|link| link.account_id)
            .collect())
    }

    fn modifiers(&self, ids: &[Uuid]) -> ResultEngine<Vec<Modifier>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.modifiers.get(id).cloned())
            .collect())
    }

    fn modifiers_by_action(&self, action: ModifierAction) -> ResultEngine<Vec<Modifier>> {
        Ok(self
            .modifiers
            .values()
            .filter(|modifier| modifier.action == action)
            .cloned()
            .collect())
    }

    fn modifier_atoms(&self, modifier_id: Uuid) -> ResultEngine<Vec<ModifierAtom>> {
        Ok(self
            .modifier_atoms
            .iter()
            .filter(|atom| atom.modifier_id == modifier_id)
            .cloned()
            .collect())
    }

    fn financial_entries(
        &self,
        modifier_ids: &[Uuid],
        until: DateTime<Utc>,
    ) -> ResultEngine<Vec<FinancialEntry>> {
        let mut entries: Vec<FinancialEntry> = self
            .financial_entries
            .iter()
            .filter(|entry| modifier_ids.contains(&entry.modifier_id) && entry.transacted_at <= until)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.transacted_at);
        Ok(entries)
    }

    fn financial_entry_atoms(&self, entry_ids: &[Uuid]) -> ResultEngine<Vec<FinancialEntryAtom>> {
        Ok(self
            .financial_entry_atoms
            .iter()
            .filter(|atom| entry_ids.contains(&atom.financial_entry_id))
            .cloned()
            .collect())
    }

    fn summary_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<SummaryCalculation>> {
        Ok(self
            .summaries
            .iter()
            .filter(|row| {
                row.frozen_period_id
                    .is_some_and(|period_id| period_ids.contains(&period_id))
                    && account_ids.contains(&row.account_id)
            })
            .cloned()
            .collect())
    }

    fn flow_calculations(
        &self,
        period_ids: &[Uuid],
        account_ids: &[Uuid],
    ) -> ResultEngine<Vec<FlowCalculation>> {
        Ok(self
            .flows
            .iter()
            .filter(|row| {
                row.frozen_period_id
                    .is_some_and(|period_id| period_ids.contains(&period_id))
                    && account_ids.contains(&row.account_id)
            })
            .cloned()
            .collect())
    }

    fn compute_raw_period_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ResultEngine<RawPeriodData> {
        calculation::compute_period(self, start, end)
    }
}
