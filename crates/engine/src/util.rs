//! Internal helpers for model conversion.
//!
//! These utilities are **not** part of the public API. They centralize the
//! mapping between stored text columns and typed values so every table is
//! decoded the same way.

use num_rational::BigRational;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, money};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::KeyNotFound(format!("invalid {label} id")))
}

/// Same as [`parse_uuid`] for nullable columns.
pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|value| parse_uuid(value, label)).transpose()
}

/// Parse an exact amount stored as text.
pub(crate) fn parse_stored_amount(value: &str, label: &str) -> ResultEngine<BigRational> {
    money::parse_amount(value)
        .map_err(|_| EngineError::InvalidAmount(format!("invalid stored {label}: {value}")))
}

/// Convert a stored scale into `u32`, rejecting negative values.
pub(crate) fn parse_scale(value: i32, label: &str) -> ResultEngine<u32> {
    u32::try_from(value).map_err(|_| EngineError::InvalidAmount(format!("negative {label}")))
}
