use std::collections::HashMap;

use num_rational::BigRational;
use num_traits::{Signed, Zero};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    AtomValues, EngineError, EntryAtomValueKind, ModifierAction, ModifierAtomKind, ReportContext,
    ResultEngine, Side, money,
};

/// One submitted value of a proposed financial entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FinancialEntryAtomInput {
    pub modifier_atom_id: Uuid,
    pub kind: EntryAtomValueKind,
    /// Exact decimal or fraction text.
    pub numerical_value: String,
}

/// Checks that the values of a proposed financial entry are complete and keep
/// the ledger balanced under its modifier.
pub struct FinancialEntryAtomInputExaminer<'c> {
    context: &'c ReportContext<'c>,
    key: String,
    atoms: Option<Vec<FinancialEntryAtomInput>>,
}

impl<'c> FinancialEntryAtomInputExaminer<'c> {
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

    pub fn atoms(&self) -> Option<&[FinancialEntryAtomInput]> {
        self.atoms.as_deref()
    }

    pub fn validate_currency_values(&self, modifier_id: Uuid) -> ResultEngine<bool> {
        let Some(inputs) = self.atoms.as_deref() else {
            return Ok(false);
        };
        let modifier = match self.context.modifier(modifier_id) {
            Ok(modifier) => modifier,
            Err(EngineError::KeyNotFound(_)) => {
                tracing::warn!("unknown modifier {modifier_id}");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        if modifier.is_deleted() {
            return Ok(false);
        }
        let modifier_atoms = self.context.modifier_atoms(modifier_id)?;
        if modifier_atoms.is_empty() {
            return Ok(false);
        }
        let kinds: HashMap<Uuid, ModifierAtomKind> = modifier_atoms
            .iter()
            .map(|atom| (atom.id, atom.kind))
            .collect();

        let mut values: HashMap<Uuid, AtomValues> = HashMap::new();
        for input in inputs {
            match kinds.get(&input.modifier_atom_id) {
                None | Some(ModifierAtomKind::Emergent) => return Ok(false),
                Some(_) => {}
            }
            let Ok(value) = money::parse_amount(&input.numerical_value) else {
                return Ok(false);
            };
            if value.is_negative() {
                return Ok(false);
            }
            if !values
                .entry(input.modifier_atom_id)
                .or_default()
                .insert(input.kind, value)
            {
                return Ok(false);
            }
        }

        let consistent = values.values().all(|atom| match (&atom.total, atom.derived_total()) {
            (Some(total), Some(derived)) => *total == derived,
            _ => true,
        });
        if !consistent {
            return Ok(false);
        }

        let valued_atoms = modifier_atoms
            .iter()
            .filter(|atom| atom.kind != ModifierAtomKind::Emergent);
        let has_emergent = modifier_atoms
            .iter()
            .any(|atom| atom.kind == ModifierAtomKind::Emergent);

        if matches!(
            modifier.action,
            ModifierAction::Dilute | ModifierAction::Condense
        ) {
            return Ok(valued_atoms.clone().all(|atom| {
                values
                    .get(&atom.id)
                    .and_then(|value| value.quantity.as_ref())
                    .is_some_and(Signed::is_positive)
            }));
        }

        let mut debit = BigRational::zero();
        let mut credit = BigRational::zero();
        for atom in valued_atoms {
            let Some(total) = values.get(&atom.id).and_then(AtomValues::resolved_total) else {
                return Ok(false);
            };
            if modifier.action == ModifierAction::Exchange && !total.is_positive() {
                return Ok(false);
            }
            match atom.kind.side() {
                Some(Side::Debit) => debit += total,
                Some(Side::Credit) => credit += total,
                None => {}
            }
        }

        Ok(match modifier.action {
            ModifierAction::Exchange => true,
            _ => has_emergent || debit == credit,
        })
    }
}
