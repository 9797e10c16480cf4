//! Exchange-rate derivation.
//!
//! Rates are never configured: they are observed from historical `Exchange`
//! financial entries. Each such entry yields one [`ExchangeRateInfo`], where
//! the debit leg is the conversion destination and the credit leg the source.
//!
//! [`ExchangeRateCache`] grows the set of observations as reports ask for new
//! currencies, never looking past the report's cutoff, and builds one
//! [`ExchangeRateDerivator`] per target time. A derivator keeps, for every
//! ordered currency pair, the most recent observation not after its target
//! time (later-scanned observations win ties) and converts along direct
//! pairs, or along the shortest chain of them.
//!
//! Stored entries were examined when written, so an exchange entry whose legs
//! cannot be resolved is a data error: loading fails with it instead of
//! skipping the entry.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use num_rational::BigRational;
use num_traits::{One, Zero};
use uuid::Uuid;

use crate::{
    FinancialEntry, FinancialEntryAtom, Leg, ModifierAction, ReportContext, ResultEngine, Side,
    legs::{group_values, resolve_legs},
};

/// One observed conversion: `source_value` units of the source currency were
/// exchanged for `destination_value` units of the destination currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRateInfo {
    pub financial_entry_id: Uuid,
    pub source_currency_id: Uuid,
    pub source_value: BigRational,
    pub destination_currency_id: Uuid,
    pub destination_value: BigRational,
    pub observed_at: DateTime<Utc>,
}

impl ExchangeRateInfo {
    /// Builds the observation of an exchange entry from its resolved legs.
    ///
    /// `currency_of` maps an account id to its currency id. Returns `None`
    /// when the legs do not describe a conversion between two currencies.
    pub fn from_legs(
        entry: &FinancialEntry,
        legs: &[Leg],
        currency_of: impl Fn(Uuid) -> Option<Uuid>,
    ) -> Option<Self> {
        let debit = legs.iter().find(|leg| leg.side == Side::Debit)?;
        let credit = legs.iter().find(|leg| leg.side == Side::Credit)?;
        if debit.amount.is_zero() || credit.amount.is_zero() {
            return None;
        }
        let destination_currency_id = currency_of(debit.account_id)?;
        let source_currency_id = currency_of(credit.account_id)?;
        if destination_currency_id == source_currency_id {
            return None;
        }
        Some(Self {
            financial_entry_id: entry.id,
            source_currency_id,
            source_value: credit.amount.clone(),
            destination_currency_id,
            destination_value: debit.amount.clone(),
            observed_at: entry.transacted_at,
        })
    }

    /// Destination units obtained for one source unit.
    pub fn rate(&self) -> BigRational {
        &self.destination_value / &self.source_value
    }
}

#[derive(Debug, Default)]
pub struct ExchangeRateCache {
    known_currencies: HashSet<Uuid>,
    observations: Vec<ExchangeRateInfo>,
    observed_entries: HashSet<Uuid>,
    derivators: HashMap<DateTime<Utc>, ExchangeRateDerivator>,
}

impl ExchangeRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> &[ExchangeRateInfo] {
        &self.observations
    }

    /// Extends the known currencies with `currency_ids` and scans the exchange
    /// entries transacted at or before `cutoff` for observations pairing a
    /// newly known currency with a known one.
    pub fn load_rates_for_currencies(
        &mut self,
        context: &ReportContext<'_>,
        currency_ids: &[Uuid],
        cutoff: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let new_currencies: HashSet<Uuid> = currency_ids
            .iter()
            .copied()
            .filter(|id| !self.known_currencies.contains(id))
            .collect();
        if new_currencies.is_empty() {
            return Ok(());
        }
        self.known_currencies.extend(new_currencies.iter().copied());

        let source = context.source();
        let modifier_ids: Vec<Uuid> = source
            .modifiers_by_action(ModifierAction::Exchange)?
            .into_iter()
            .map(|modifier| modifier.id)
            .collect();
        if modifier_ids.is_empty() {
            return Ok(());
        }

        let entries: Vec<FinancialEntry> = source
            .financial_entries(&modifier_ids, cutoff)?
            .into_iter()
            .filter(|entry| !self.observed_entries.contains(&entry.id))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        let entry_ids: Vec<Uuid> = entries.iter().map(|entry| entry.id).collect();
        let mut atoms_by_entry: HashMap<Uuid, Vec<FinancialEntryAtom>> = HashMap::new();
        for atom in source.financial_entry_atoms(&entry_ids)? {
            atoms_by_entry
                .entry(atom.financial_entry_id)
                .or_default()
                .push(atom);
        }

        let mut found = Vec::new();
        for entry in &entries {
            let modifier_atoms = context.modifier_atoms(entry.modifier_id)?;
            let values = group_values(
                atoms_by_entry
                    .get(&entry.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
            );
            let legs = resolve_legs(ModifierAction::Exchange, entry, &modifier_atoms, &values)?;
            let account_ids: Vec<Uuid> = legs.iter().map(|leg| leg.account_id).collect();
            let accounts = context.accounts(&account_ids)?;
            let info = ExchangeRateInfo::from_legs(entry, &legs, |account_id| {
                accounts
                    .iter()
                    .find(|account| account.id == account_id)
                    .map(|account| account.currency_id)
            });
            let Some(info) = info else {
                continue;
            };
            let source_new = new_currencies.contains(&info.source_currency_id);
            let destination_new = new_currencies.contains(&info.destination_currency_id);
            let pairs_new_with_known = (source_new
                && self.known_currencies.contains(&info.destination_currency_id))
                || (destination_new && self.known_currencies.contains(&info.source_currency_id));
            if pairs_new_with_known {
                found.push(info);
            }
        }

        tracing::debug!(
            "loaded {} exchange observations for {} new currencies",
            found.len(),
            new_currencies.len()
        );
        self.absorb(found, cutoff);
        Ok(())
    }

    /// Adds observations found elsewhere (e.g. in raw period data), ignoring
    /// those after `cutoff` and those already known.
    pub fn absorb(
        &mut self,
        observations: impl IntoIterator<Item = ExchangeRateInfo>,
        cutoff: DateTime<Utc>,
    ) {
        let mut added = false;
        for info in observations {
            if info.observed_at > cutoff || !self.observed_entries.insert(info.financial_entry_id)
            {
                continue;
            }
            self.observations.push(info);
            added = true;
        }
        if added {
            self.derivators.clear();
        }
    }

    /// Derivator valid as of `target_time`, memoized per target time.
    pub fn build_derivator(&mut self, target_time: DateTime<Utc>) -> &ExchangeRateDerivator {
        let observations = &self.observations;
        self.derivators
            .entry(target_time)
            .or_insert_with(|| ExchangeRateDerivator::new(target_time, observations))
    }
}

#[derive(Clone, Debug)]
pub struct ExchangeRateDerivator {
    target_time: DateTime<Utc>,
    rates: HashMap<(Uuid, Uuid), ExchangeRateInfo>,
}

impl ExchangeRateDerivator {
    pub fn new(target_time: DateTime<Utc>, observations: &[ExchangeRateInfo]) -> Self {
        let mut visible: Vec<&ExchangeRateInfo> = observations
            .iter()
            .filter(|info| info.observed_at <= target_time)
            .collect();
        visible.sort_by_key(|info| info.observed_at);

        let mut rates = HashMap::new();
        for info in visible {
            rates.insert(
                (info.source_currency_id, info.destination_currency_id),
                info.clone(),
            );
        }
        Self { target_time, rates }
    }

    pub fn target_time(&self) -> DateTime<Utc> {
        self.target_time
    }

    /// Observation retained for the ordered pair, if any.
    pub fn observation(&self, source: Uuid, destination: Uuid) -> Option<&ExchangeRateInfo> {
        self.rates.get(&(source, destination))
    }

    /// Ratio from a direct pair, in either direction; the more recent of the
    /// two directions wins, the forward one on a tie.
    fn direct_ratio(&self, from: Uuid, to: Uuid) -> Option<BigRational> {
        let forward = self.rates.get(&(from, to));
        let backward = self.rates.get(&(to, from));
        match (forward, backward) {
            (Some(forward), Some(backward)) if backward.observed_at > forward.observed_at => {
                Some(&backward.source_value / &backward.destination_value)
            }
            (Some(forward), _) => Some(forward.rate()),
            (None, Some(backward)) => Some(&backward.source_value / &backward.destination_value),
            (None, None) => None,
        }
    }

    /// Units of `to` worth one unit of `from`.
    pub fn ratio(&self, from: Uuid, to: Uuid) -> Option<BigRational> {
        if from == to {
            return Some(BigRational::one());
        }
        if let Some(ratio) = self.direct_ratio(from, to) {
            return Some(ratio);
        }

        let mut neighbours: BTreeMap<Uuid, BTreeSet<Uuid>> = BTreeMap::new();
        for (source, destination) in self.rates.keys() {
            neighbours.entry(*source).or_default().insert(*destination);
            neighbours.entry(*destination).or_default().insert(*source);
        }

        let mut previous: HashMap<Uuid, Uuid> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut visited = HashSet::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            for next in neighbours.get(&current).into_iter().flatten() {
                if visited.insert(*next) {
                    previous.insert(*next, current);
                    queue.push_back(*next);
                }
            }
        }

        let mut path = vec![to];
        let mut cursor = to;
        while cursor != from {
            cursor = *previous.get(&cursor)?;
            path.push(cursor);
        }
        path.reverse();

        let mut ratio = BigRational::one();
        for hop in path.windows(2) {
            ratio *= self.direct_ratio(hop[0], hop[1])?;
        }
        Some(ratio)
    }

    pub fn convert(&self, amount: &BigRational, from: Uuid, to: Uuid) -> Option<BigRational> {
        self.ratio(from, to).map(|ratio| amount * ratio)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use num_bigint::BigInt;

    use super::*;

    fn value(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn observation(
        source: Uuid,
        source_value: i64,
        destination: Uuid,
        destination_value: i64,
        observed_at: DateTime<Utc>,
    ) -> ExchangeRateInfo {
        ExchangeRateInfo {
            financial_entry_id: Uuid::new_v4(),
            source_currency_id: source,
            source_value: value(source_value),
            destination_currency_id: destination,
            destination_value: value(destination_value),
            observed_at,
        }
    }

    #[test]
    fn latest_observation_not_after_target_wins() {
        let (usd, eur) = (Uuid::new_v4(), Uuid::new_v4());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = vec![
            observation(usd, 1, eur, 2, start),
            observation(usd, 1, eur, 3, start + Duration::days(10)),
            observation(usd, 1, eur, 4, start + Duration::days(20)),
        ];

        let derivator = ExchangeRateDerivator::new(start + Duration::days(15), &observations);
        assert_eq!(derivator.target_time(), start + Duration::days(15));
        assert_eq!(
            derivator.observation(usd, eur).map(|info| info.observed_at),
            Some(start + Duration::days(10))
        );
        assert!(derivator.observation(eur, usd).is_none());
        assert_eq!(derivator.ratio(usd, eur), Some(value(3)));
        assert_eq!(
            derivator.ratio(eur, usd),
            Some(BigRational::new(BigInt::from(1), BigInt::from(3)))
        );

        let before = ExchangeRateDerivator::new(start - Duration::days(1), &observations);
        assert_eq!(before.ratio(usd, eur), None);
        assert_eq!(before.ratio(usd, usd), Some(value(1)));
    }

    #[test]
    fn ties_keep_the_later_scanned_observation() {
        let (usd, eur) = (Uuid::new_v4(), Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = vec![observation(usd, 1, eur, 2, at), observation(usd, 1, eur, 5, at)];
        let derivator = ExchangeRateDerivator::new(at, &observations);
        assert_eq!(
            derivator.observation(usd, eur).map(|info| info.financial_entry_id),
            Some(observations[1].financial_entry_id)
        );
        assert_eq!(derivator.ratio(usd, eur), Some(value(5)));
    }

    #[test]
    fn most_recent_direction_wins() {
        let (usd, eur) = (Uuid::new_v4(), Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = vec![
            observation(usd, 1, eur, 2, at),
            observation(eur, 4, usd, 1, at + Duration::days(1)),
        ];
        let derivator = ExchangeRateDerivator::new(at + Duration::days(2), &observations);
        assert_eq!(derivator.ratio(usd, eur), Some(value(4)));
    }

    #[test]
    fn converts_through_intermediate_currency() {
        let (btc, usd, eur, jpy) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = vec![
            observation(btc, 1, usd, 50_000, at),
            observation(eur, 1, usd, 2, at),
        ];
        let derivator = ExchangeRateDerivator::new(at, &observations);
        assert_eq!(derivator.convert(&value(2), btc, eur), Some(value(50_000)));
        assert_eq!(derivator.ratio(btc, jpy), None);
    }

    #[test]
    fn absorb_respects_cutoff_and_deduplicates() {
        let (usd, eur) = (Uuid::new_v4(), Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let kept = observation(usd, 1, eur, 2, at);
        let late = observation(usd, 1, eur, 9, at + Duration::days(30));

        let mut cache = ExchangeRateCache::new();
        cache.absorb([kept.clone(), late, kept.clone()], at + Duration::days(1));
        assert_eq!(cache.observations(), &[kept]);
        assert_eq!(
            cache.build_derivator(at + Duration::days(60)).ratio(usd, eur),
            Some(value(2))
        );
    }
}
