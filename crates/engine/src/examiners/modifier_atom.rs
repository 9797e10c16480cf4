use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{AccountKind, ModifierAction, ModifierAtomKind, ReportContext, ResultEngine};

/// One leg of a proposed modifier.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModifierAtomInput {
    pub account_id: Uuid,
    pub kind: ModifierAtomKind,
    #[serde(default)]
    pub cash_flow_activity_id: Option<Uuid>,
}

/// A leg the shape of an action asks for.
struct Slot {
    kind: ModifierAtomKind,
    accepts: fn(AccountKind) -> bool,
    optional: bool,
}

impl Slot {
    const fn required(kind: ModifierAtomKind, accepts: fn(AccountKind) -> bool) -> Self {
        Self {
            kind,
            accepts,
            optional: false,
        }
    }

    const fn optional(kind: ModifierAtomKind, accepts: fn(AccountKind) -> bool) -> Self {
        Self {
            kind,
            accepts,
            optional: true,
        }
    }
}

fn not_itemized(kind: AccountKind) -> bool {
    !kind.is_itemized()
}

fn itemized(kind: AccountKind) -> bool {
    kind.is_itemized()
}

fn cash_like(kind: AccountKind) -> bool {
    kind.is_cash_like()
}

fn gain_or_loss(kind: AccountKind) -> bool {
    kind.is_gain_or_loss()
}

fn closable(kind: AccountKind) -> bool {
    kind.is_nominal() || kind == AccountKind::Equity
}

fn slots(action: ModifierAction) -> Vec<Slot> {
    use ModifierAtomKind::*;

    match action {
        ModifierAction::Record => vec![
            Slot::required(RealDebit, not_itemized),
            Slot::required(RealCredit, not_itemized),
        ],
        ModifierAction::Bid => vec![
            Slot::required(Debitem, itemized),
            Slot::required(RealCredit, cash_like),
            Slot::optional(Emergent, gain_or_loss),
        ],
        ModifierAction::Ask => vec![
            Slot::required(Creditem, itemized),
            Slot::required(RealDebit, cash_like),
            Slot::optional(Emergent, gain_or_loss),
        ],
        ModifierAction::Exchange => vec![
            Slot::required(RealDebit, cash_like),
            Slot::required(RealCredit, cash_like),
        ],
        ModifierAction::Dilute => vec![Slot::required(Debitem, itemized)],
        ModifierAction::Condense => vec![Slot::required(Creditem, itemized)],
        ModifierAction::Close => vec![
            Slot::required(RealDebit, closable),
            Slot::required(RealCredit, closable),
        ],
    }
}

/// Whether every leg fills a distinct slot and every required slot is
/// filled exactly once.
fn fits(legs: &[(AccountKind, ModifierAtomKind)], slots: &[Slot]) -> bool {
    let mut used = vec![0_usize; slots.len()];
    for (account_kind, atom_kind) in legs {
        let Some(index) = slots.iter().position(|slot| slot.kind == *atom_kind) else {
            return false;
        };
        if !(slots[index].accepts)(*account_kind) {
            return false;
        }
        used[index] += 1;
    }
    slots
        .iter()
        .zip(used)
        .all(|(slot, count)| count == 1 || (slot.optional && count == 0))
}

/// Checks that the legs of a proposed modifier form a legal shape for its
/// action.
pub struct ModifierAtomInputExaminer<'c> {
    context: &'c ReportContext<'c>,
    key: String,
    atoms: Option<Vec<ModifierAtomInput>>,
}

impl<'c> ModifierAtomInputExaminer<'c> {
    /// Reads the legs from the array under `key` in `payload`.
    pub fn make(context: &'c ReportContext<'c>, key: &str, payload: &Value) -> Self {
        Self {
            context,
            key: key.to_string(),
            atoms: super::read_items(key, payload),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn atoms(&self) -> Option<&[ModifierAtomInput]> {
        self.atoms.as_deref()
    }

    pub fn validate_action(&self, action: ModifierAction) -> ResultEngine<bool> {
        let Some(atoms) = self.atoms.as_deref() else {
            return Ok(false);
        };

        let mut seen = HashSet::new();
        if !atoms.iter().all(|atom| seen.insert(atom.account_id)) {
            return Ok(false);
        }

        let account_ids: Vec<Uuid> = atoms.iter().map(|atom| atom.account_id).collect();
        let accounts = self.context.accounts(&account_ids)?;
        if accounts.len() != atoms.len() || accounts.iter().any(|account| account.is_deleted()) {
            return Ok(false);
        }

        let currencies: HashSet<Uuid> = accounts.iter().map(|account| account.currency_id).collect();
        let currencies_fit = match action {
            ModifierAction::Exchange => currencies.len() == 2,
            _ => currencies.len() == 1,
        };
        if !currencies_fit {
            return Ok(false);
        }

        let legs: Vec<(AccountKind, ModifierAtomKind)> = atoms
            .iter()
            .zip(&accounts)
            .map(|(atom, account)| (account.kind, atom.kind))
            .collect();
        if !fits(&legs, &slots(action)) {
            return Ok(false);
        }

        if action == ModifierAction::Close {
            return Ok(legs.iter().any(|(kind, _)| kind.is_nominal()));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_needs_exactly_two_plain_legs() {
        let slots = slots(ModifierAction::Record);
        assert!(fits(
            &[
                (AccountKind::Expense, ModifierAtomKind::RealDebit),
                (AccountKind::LiquidAsset, ModifierAtomKind::RealCredit),
            ],
            &slots
        ));
        assert!(!fits(
            &[(AccountKind::Expense, ModifierAtomKind::RealDebit)],
            &slots
        ));
        assert!(!fits(
            &[
                (AccountKind::ItemizedAsset, ModifierAtomKind::RealDebit),
                (AccountKind::LiquidAsset, ModifierAtomKind::RealCredit),
            ],
            &slots
        ));
    }

    #[test]
    fn emergent_leg_is_optional_for_trades() {
        let slots = slots(ModifierAction::Ask);
        let base = [
            (AccountKind::ItemizedAsset, ModifierAtomKind::Creditem),
            (AccountKind::GeneralAsset, ModifierAtomKind::RealDebit),
        ];
        assert!(fits(&base, &slots));
        let mut with_gain = base.to_vec();
        with_gain.push((AccountKind::NominalReturn, ModifierAtomKind::Emergent));
        assert!(fits(&with_gain, &slots));
        with_gain.push((AccountKind::Income, ModifierAtomKind::Emergent));
        assert!(!fits(&with_gain, &slots));
    }
}
