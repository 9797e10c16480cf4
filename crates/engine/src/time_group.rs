//! Time-group aggregation.
//!
//! A report is laid out over chronologically ordered [`TimeGroup`]s: the
//! frozen periods, whose rows are read from storage, optionally followed by
//! one trailing unfrozen group whose rows are computed on demand, once per
//! report. [`TimeGroupManager`] answers "total of these accounts at this
//! stage and side" with one exact amount per time group, every amount
//! converted into the report's destination currency with the exchange rates
//! known at the group's finish.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use num_rational::BigRational;
use num_traits::Zero;
use uuid::Uuid;

use crate::{
    EngineError, ExchangeRateCache, FlowCalculation, FrozenPeriod, ReportContext, ResultEngine,
    Side, Stage, SummaryCalculation, UnreachableCurrencyPolicy,
};

#[derive(Clone, Debug)]
pub struct PeriodicTimeGroup {
    pub period: FrozenPeriod,
    summaries: HashMap<Uuid, SummaryCalculation>,
    flows: HashMap<(Uuid, Uuid), BigRational>,
}

impl PeriodicTimeGroup {
    pub fn new(period: FrozenPeriod) -> Self {
        Self {
            period,
            summaries: HashMap::new(),
            flows: HashMap::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UnfrozenTimeGroup {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    computed: bool,
    summaries: HashMap<Uuid, SummaryCalculation>,
    flows: HashMap<(Uuid, Uuid), BigRational>,
}

impl UnfrozenTimeGroup {
    pub fn new(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at,
            computed: false,
            summaries: HashMap::new(),
            flows: HashMap::new(),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.computed
    }
}

#[derive(Clone, Debug)]
pub enum TimeGroup {
    Periodic(PeriodicTimeGroup),
    Unfrozen(UnfrozenTimeGroup),
}

impl TimeGroup {
    pub fn periodic(period: FrozenPeriod) -> Self {
        Self::Periodic(PeriodicTimeGroup::new(period))
    }

    pub fn unfrozen(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self::Unfrozen(UnfrozenTimeGroup::new(started_at, finished_at))
    }

    /// The frozen periods in chronological order, followed by the unfrozen
    /// group `[last finish, now)` when `now` is later than every period.
    pub fn layout(mut periods: Vec<FrozenPeriod>, now: DateTime<Utc>) -> Vec<Self> {
        periods.sort_by_key(|period| period.started_at);
        let trailing_start = periods
            .last()
            .map_or(DateTime::<Utc>::MIN_UTC, |period| period.finished_at);
        let mut groups: Vec<Self> = periods.into_iter().map(Self::periodic).collect();
        if trailing_start < now {
            groups.push(Self::unfrozen(trailing_start, now));
        }
        groups
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            Self::Periodic(group) => group.period.started_at,
            Self::Unfrozen(group) => group.started_at,
        }
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        match self {
            Self::Periodic(group) => group.period.finished_at,
            Self::Unfrozen(group) => group.finished_at,
        }
    }

    pub fn frozen_period_id(&self) -> Option<Uuid> {
        match self {
            Self::Periodic(group) => Some(group.period.id),
            Self::Unfrozen(_) => None,
        }
    }

    /// Row of `account_id` owned by this group, if any.
    pub fn summary(&self, account_id: Uuid) -> Option<&SummaryCalculation> {
        match self {
            Self::Periodic(group) => group.summaries.get(&account_id),
            Self::Unfrozen(group) => group.summaries.get(&account_id),
        }
    }

    pub fn flow(&self, cash_flow_activity_id: Uuid, account_id: Uuid) -> Option<&BigRational> {
        let key = (cash_flow_activity_id, account_id);
        match self {
            Self::Periodic(group) => group.flows.get(&key),
            Self::Unfrozen(group) => group.flows.get(&key),
        }
    }

    fn insert_summary(&mut self, row: SummaryCalculation) {
        let summaries = match self {
            Self::Periodic(group) => &mut group.summaries,
            Self::Unfrozen(group) => &mut group.summaries,
        };
        summaries.insert(row.account_id, row);
    }

    fn insert_flow(&mut self, row: FlowCalculation) {
        let flows = match self {
            Self::Periodic(group) => &mut group.flows,
            Self::Unfrozen(group) => &mut group.flows,
        };
        let net = flows
            .entry((row.cash_flow_activity_id, row.account_id))
            .or_insert_with(BigRational::zero);
        *net += row.net_amount;
    }
}

pub struct TimeGroupManager<'a> {
    context: &'a ReportContext<'a>,
    time_groups: Vec<TimeGroup>,
    destination_currency_id: Uuid,
    cutoff: DateTime<Utc>,
    loaded_accounts: HashSet<Uuid>,
    rates: ExchangeRateCache,
}

impl<'a> TimeGroupManager<'a> {
    /// `time_groups` must be sorted chronologically; only the last one may be
    /// unfrozen.
    pub fn new(
        context: &'a ReportContext<'a>,
        time_groups: Vec<TimeGroup>,
        destination_currency_id: Uuid,
    ) -> Self {
        debug_assert!(
            time_groups
                .windows(2)
                .all(|pair| pair[0].finished_at() <= pair[1].started_at()),
            "time groups must be sorted chronologically"
        );
        let latest = time_groups
            .last()
            .map_or_else(Utc::now, TimeGroup::finished_at);
        Self {
            context,
            time_groups,
            destination_currency_id,
            cutoff: context.settings().cutoff_for(latest),
            loaded_accounts: HashSet::new(),
            rates: ExchangeRateCache::new(),
        }
    }

    pub fn context(&self) -> &'a ReportContext<'a> {
        self.context
    }

    pub fn time_groups(&self) -> &[TimeGroup] {
        &self.time_groups
    }

    pub fn destination_currency_id(&self) -> Uuid {
        self.destination_currency_id
    }

    /// Latest moment whose exchange observations this report may use.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn total_opened_debit_amount(&mut self, ids: &[Uuid]) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Opened, Side::Debit, ids)
    }

    pub fn total_opened_credit_amount(&mut self, ids: &[Uuid]) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Opened, Side::Credit, ids)
    }

    pub fn total_unadjusted_debit_amount(
        &mut self,
        ids: &[Uuid],
    ) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Unadjusted, Side::Debit, ids)
    }

    pub fn total_unadjusted_credit_amount(
        &mut self,
        ids: &[Uuid],
    ) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Unadjusted, Side::Credit, ids)
    }

    pub fn total_closed_debit_amount(&mut self, ids: &[Uuid]) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Closed, Side::Debit, ids)
    }

    pub fn total_closed_credit_amount(&mut self, ids: &[Uuid]) -> ResultEngine<Vec<BigRational>> {
        self.total_amount(Stage::Closed, Side::Credit, ids)
    }

    /// One total per time group of the `stage`/`side` amounts of `ids`, in
    /// the destination currency. Accounts without a row in a group add
    /// nothing to it.
    pub fn total_amount(
        &mut self,
        stage: Stage,
        side: Side,
        ids: &[Uuid],
    ) -> ResultEngine<Vec<BigRational>> {
        let ids = unique(ids);
        self.ensure_loaded(&ids)?;

        let mut totals = Vec::with_capacity(self.time_groups.len());
        for group in &self.time_groups {
            let mut total = BigRational::zero();
            for id in &ids {
                let Some(row) = group.summary(*id) else {
                    continue;
                };
                let amount = row.amount(stage, side);
                if amount.is_zero() {
                    continue;
                }
                total += convert(
                    self.context,
                    &mut self.rates,
                    amount,
                    *id,
                    self.destination_currency_id,
                    group.finished_at(),
                )?;
            }
            totals.push(total);
        }
        Ok(totals)
    }

    /// One total per time group of the net amounts `ids` moved under a cash
    /// flow activity, debits positive.
    pub fn total_net_flow_amount(
        &mut self,
        cash_flow_activity_id: Uuid,
        ids: &[Uuid],
    ) -> ResultEngine<Vec<BigRational>> {
        let ids = unique(ids);
        self.ensure_loaded(&ids)?;

        let mut totals = Vec::with_capacity(self.time_groups.len());
        for group in &self.time_groups {
            let mut total = BigRational::zero();
            for id in &ids {
                let Some(amount) = group.flow(cash_flow_activity_id, *id) else {
                    continue;
                };
                if amount.is_zero() {
                    continue;
                }
                total += convert(
                    self.context,
                    &mut self.rates,
                    amount,
                    *id,
                    self.destination_currency_id,
                    group.finished_at(),
                )?;
            }
            totals.push(total);
        }
        Ok(totals)
    }

    fn ensure_loaded(&mut self, ids: &[Uuid]) -> ResultEngine<()> {
        self.materialize_unfrozen()?;

        let missing: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !self.loaded_accounts.contains(id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let accounts = self.context.accounts(&missing)?;
        let mut currency_ids: Vec<Uuid> = accounts.iter().map(|account| account.currency_id).collect();
        currency_ids.push(self.destination_currency_id);
        self.rates
            .load_rates_for_currencies(self.context, &currency_ids, self.cutoff)?;

        let mut index_by_period: HashMap<Uuid, usize> = HashMap::new();
        for (index, group) in self.time_groups.iter().enumerate() {
            if let Some(period_id) = group.frozen_period_id() {
                index_by_period.insert(period_id, index);
            }
        }
        if !index_by_period.is_empty() {
            let period_ids: Vec<Uuid> = index_by_period.keys().copied().collect();
            let source = self.context.source();
            let summaries = source.summary_calculations(&period_ids, &missing)?;
            let flows = source.flow_calculations(&period_ids, &missing)?;
            tracing::debug!(
                "loaded {} summary and {} flow rows for {} accounts",
                summaries.len(),
                flows.len(),
                missing.len()
            );
            for row in summaries {
                let index = row
                    .frozen_period_id
                    .and_then(|period_id| index_by_period.get(&period_id));
                if let Some(&index) = index {
                    self.time_groups[index].insert_summary(row);
                }
            }
            for row in flows {
                let index = row
                    .frozen_period_id
                    .and_then(|period_id| index_by_period.get(&period_id));
                if let Some(&index) = index {
                    self.time_groups[index].insert_flow(row);
                }
            }
        }

        self.loaded_accounts.extend(missing);
        Ok(())
    }

    /// Computes the rows of the trailing unfrozen group, at most once.
    fn materialize_unfrozen(&mut self) -> ResultEngine<()> {
        let Some(TimeGroup::Unfrozen(group)) = self.time_groups.last_mut() else {
            return Ok(());
        };
        if group.computed {
            return Ok(());
        }

        let raw = self
            .context
            .source()
            .compute_raw_period_data(group.started_at, group.finished_at)?;
        tracing::debug!(
            "computed unfrozen period {} - {}: {} summaries, {} flows",
            group.started_at,
            group.finished_at,
            raw.summaries.len(),
            raw.flows.len()
        );
        group.computed = true;
        for row in raw.summaries {
            group.summaries.insert(row.account_id, row);
        }
        for row in raw.flows {
            let net = group
                .flows
                .entry((row.cash_flow_activity_id, row.account_id))
                .or_insert_with(BigRational::zero);
            *net += row.net_amount;
        }
        self.context.prime_accounts(raw.accounts);
        self.rates.absorb(raw.exchange_observations, self.cutoff);
        Ok(())
    }
}

/// Converts the amount of `account_id` into `destination` as of `at`,
/// following the configured policy when no rate path exists.
fn convert(
    context: &ReportContext<'_>,
    rates: &mut ExchangeRateCache,
    amount: &BigRational,
    account_id: Uuid,
    destination: Uuid,
    at: DateTime<Utc>,
) -> ResultEngine<BigRational> {
    let account = context.account(account_id)?;
    if account.currency_id == destination {
        return Ok(amount.clone());
    }
    if let Some(converted) = rates
        .build_derivator(at)
        .convert(amount, account.currency_id, destination)
    {
        return Ok(converted);
    }
    match context.settings().unreachable_currency {
        UnreachableCurrencyPolicy::Abort => Err(EngineError::MissingExchangeRate {
            from: account.currency_id,
            to: destination,
            at,
        }),
        UnreachableCurrencyPolicy::Skip => {
            tracing::warn!(
                "skipping account {account_id}: no rate from {} to {destination} at {at}",
                account.currency_id
            );
            Ok(BigRational::zero())
        }
    }
}

fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
