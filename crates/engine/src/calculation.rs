//! Period calculation.
//!
//! Computes the summary and flow rows of `[start, end)` straight from the
//! financial entries. This is how the trailing unfrozen group is
//! materialized and how a period's rows are produced when it is frozen.
//!
//! An entry whose legs cannot be resolved fails the whole computation, the
//! same way exchange-rate loading treats it.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use num_rational::BigRational;
use num_traits::Zero;
use uuid::Uuid;

use crate::{
    EngineError, ExchangeRateInfo, FinancialEntryAtom, FlowCalculation, LedgerSnapshot,
    ModifierAction, ModifierAtom, RawPeriodData, ResultEngine, SummaryCalculation,
    legs::{group_values, resolve_legs},
};

/// Rows of `[start, end)` for every account of `ledger`.
///
/// Entries before `start` make up the opened stage; closing entries inside
/// the period only reach the closed stage and never move cash flows.
pub fn compute_period(
    ledger: &LedgerSnapshot,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ResultEngine<RawPeriodData> {
    if start > end {
        return Err(EngineError::InvalidPeriod(format!(
            "period starts after it finishes ({start} > {end})"
        )));
    }

    let mut atoms_by_modifier: HashMap<Uuid, Vec<ModifierAtom>> = HashMap::new();
    for atom in &ledger.modifier_atoms {
        atoms_by_modifier
            .entry(atom.modifier_id)
            .or_default()
            .push(atom.clone());
    }
    let mut values_by_entry: HashMap<Uuid, Vec<FinancialEntryAtom>> = HashMap::new();
    for atom in &ledger.financial_entry_atoms {
        values_by_entry
            .entry(atom.financial_entry_id)
            .or_default()
            .push(atom.clone());
    }

    let mut entries: Vec<_> = ledger
        .financial_entries
        .iter()
        .filter(|entry| entry.transacted_at < end)
        .collect();
    entries.sort_by_key(|entry| entry.transacted_at);

    let mut opened: HashMap<Uuid, BigRational> = HashMap::new();
    let mut posted: HashMap<Uuid, BigRational> = HashMap::new();
    let mut closing: HashMap<Uuid, BigRational> = HashMap::new();
    let mut flows: BTreeMap<(Uuid, Uuid), BigRational> = BTreeMap::new();
    let mut exchange_observations = Vec::new();

    for entry in entries {
        let modifier = ledger.modifiers.get(&entry.modifier_id).ok_or_else(|| {
            EngineError::KeyNotFound(format!("modifier {} of entry {}", entry.modifier_id, entry.id))
        })?;
        let modifier_atoms = atoms_by_modifier
            .get(&modifier.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let values = group_values(
            values_by_entry
                .get(&entry.id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        );
        let legs = resolve_legs(modifier.action, entry, modifier_atoms, &values)?;

        if entry.transacted_at < start {
            for leg in &legs {
                *opened.entry(leg.account_id).or_insert_with(BigRational::zero) += leg.net();
            }
            continue;
        }

        if modifier.action == ModifierAction::Close {
            for leg in &legs {
                *closing.entry(leg.account_id).or_insert_with(BigRational::zero) += leg.net();
            }
            continue;
        }

        for leg in &legs {
            *posted.entry(leg.account_id).or_insert_with(BigRational::zero) += leg.net();
            if let Some(activity_id) = leg.cash_flow_activity_id {
                *flows
                    .entry((activity_id, leg.account_id))
                    .or_insert_with(BigRational::zero) += leg.net();
            }
        }
        if modifier.action == ModifierAction::Exchange {
            let observation = ExchangeRateInfo::from_legs(entry, &legs, |account_id| {
                ledger
                    .accounts
                    .get(&account_id)
                    .map(|account| account.currency_id)
            });
            exchange_observations.extend(observation);
        }
    }

    let zero = BigRational::zero();
    let summaries = ledger
        .accounts
        .keys()
        .map(|account_id| {
            let opened = opened.get(account_id).unwrap_or(&zero);
            let unadjusted = opened + posted.get(account_id).unwrap_or(&zero);
            let closed = &unadjusted + closing.get(account_id).unwrap_or(&zero);
            SummaryCalculation::from_nets(None, *account_id, opened, &unadjusted, &closed)
        })
        .collect();
    let flows = flows
        .into_iter()
        .map(|((cash_flow_activity_id, account_id), net_amount)| FlowCalculation {
            frozen_period_id: None,
            cash_flow_activity_id,
            account_id,
            net_amount,
        })
        .collect();

    tracing::debug!("computed period {start} - {end}");
    Ok(RawPeriodData {
        cash_flow_activities: ledger.cash_flow_activities.values().cloned().collect(),
        accounts: ledger.accounts.values().cloned().collect(),
        summaries,
        flows,
        exchange_observations,
    })
}
