//! Balance examiners.
//!
//! Examiners gate what may be written to the ledger. They read a payload
//! submitted by the caller plus reference data from a [`ReportContext`] and
//! answer `Ok(true)` or `Ok(false)`; a structural problem is never an error.
//! Errors are reserved for failures of the data source itself.
//!
//! [`ReportContext`]: crate::ReportContext

mod entry_atom;
mod modifier_atom;

pub use entry_atom::{FinancialEntryAtomInput, FinancialEntryAtomInputExaminer};
pub use modifier_atom::{ModifierAtomInput, ModifierAtomInputExaminer};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Reads the array stored under `key`, `None` when absent or malformed.
fn read_items<T: DeserializeOwned>(key: &str, payload: &Value) -> Option<Vec<T>> {
    let Some(items) = payload.get(key) else {
        tracing::warn!("payload has no \"{key}\" field");
        return None;
    };
    match serde_json::from_value(items.clone()) {
        Ok(items) => Some(items),
        Err(err) => {
            tracing::warn!("malformed \"{key}\" payload: {err}");
            None
        }
    }
}
