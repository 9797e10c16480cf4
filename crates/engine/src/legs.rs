//! Resolved legs.
//!
//! A [`Leg`] is a single posting of a financial entry: an account, a side and
//! an exact amount in the account's currency. Legs are derived from the
//! modifier atoms of the entry's modifier and the values submitted for them;
//! every ledger computation (summaries, flows, exchange rates) works on
//! legs.

use std::collections::HashMap;

use num_rational::BigRational;
use num_traits::{Signed, Zero};
use uuid::Uuid;

use crate::{
    AtomValues, EngineError, FinancialEntry, FinancialEntryAtom, ModifierAction, ModifierAtom,
    ResultEngine, Side,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leg {
    pub modifier_atom_id: Uuid,
    pub account_id: Uuid,
    pub side: Side,
    pub amount: BigRational,
    pub cash_flow_activity_id: Option<Uuid>,
}

impl Leg {
    /// Signed amount, debits positive.
    pub fn net(&self) -> BigRational {
        match self.side {
            Side::Debit => self.amount.clone(),
            Side::Credit => -self.amount.clone(),
        }
    }
}

/// Groups submitted values per modifier atom.
pub fn group_values(atoms: &[FinancialEntryAtom]) -> HashMap<Uuid, AtomValues> {
    let mut values: HashMap<Uuid, AtomValues> = HashMap::new();
    for atom in atoms {
        values
            .entry(atom.modifier_atom_id)
            .or_default()
            .insert(atom.kind, atom.numerical_value.clone());
    }
    values
}

/// Resolves the legs of `entry`.
///
/// - A regular leg takes its direct total, else `price × quantity`.
/// - `Dilute`/`Condense` legs only move quantities; without a value they
///   post zero.
/// - An emergent leg absorbs the residual of the other legs: a credit when
///   debits exceed credits (a realized gain), a debit otherwise.
pub fn resolve_legs(
    action: ModifierAction,
    entry: &FinancialEntry,
    modifier_atoms: &[ModifierAtom],
    values: &HashMap<Uuid, AtomValues>,
) -> ResultEngine<Vec<Leg>> {
    let mut legs = Vec::with_capacity(modifier_atoms.len());
    let mut residual = BigRational::zero();
    let mut emergent: Option<&ModifierAtom> = None;

    for atom in modifier_atoms {
        let Some(side) = atom.kind.side() else {
            if emergent.is_none() {
                emergent = Some(atom);
            }
            continue;
        };
        let resolved = values.get(&atom.id).and_then(AtomValues::resolved_total);
        let amount = match (resolved, action) {
            (Some(total), _) => total,
            (None, ModifierAction::Dilute | ModifierAction::Condense) => BigRational::zero(),
            (None, _) => {
                return Err(EngineError::InvalidAmount(format!(
                    "financial entry {} has no total for modifier atom {}",
                    entry.id, atom.id
                )));
            }
        };
        let leg = Leg {
            modifier_atom_id: atom.id,
            account_id: atom.account_id,
            side,
            amount,
            cash_flow_activity_id: atom.cash_flow_activity_id,
        };
        residual += leg.net();
        legs.push(leg);
    }

    if let Some(atom) = emergent {
        let side = if residual.is_positive() {
            Side::Credit
        } else {
            Side::Debit
        };
        legs.push(Leg {
            modifier_atom_id: atom.id,
            account_id: atom.account_id,
            side,
            amount: residual.abs(),
            cash_flow_activity_id: atom.cash_flow_activity_id,
        });
    }

    Ok(legs)
}
