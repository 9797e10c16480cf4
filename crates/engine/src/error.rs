//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Expression`] thrown when a report formula cannot be parsed or one of
//!   its selectors cannot be resolved.
//! - [`MissingExchangeRate`] thrown when an amount cannot be converted into
//!   the report currency.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//! Structural problems found by the balance examiners are **not** errors: the
//! examiners answer `Ok(false)`.
//!
//!  [`Expression`]: EngineError::Expression
//!  [`MissingExchangeRate`]: EngineError::MissingExchangeRate
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use std::fmt;

use chrono::{DateTime, Utc};
use config::ConfigError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error("Missing exchange rate from {from} to {to} at {at}")]
    MissingExchangeRate {
        from: Uuid,
        to: Uuid,
        at: DateTime<Utc>,
    },
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Expression(a), Self::Expression(b)) => a == b,
            (
                Self::MissingExchangeRate {
                    from: a_from,
                    to: a_to,
                    at: a_at,
                },
                Self::MissingExchangeRate {
                    from: b_from,
                    to: b_to,
                    at: b_at,
                },
            ) => a_from == b_from && a_to == b_to && a_at == b_at,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// What went wrong while handling a report formula.
///
/// The distinction is informational: every kind aborts the evaluation and no
/// partial result is ever returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// The formula text is not well formed.
    Syntax,
    /// A `COLLECTION[..]` id or an account-set macro is unknown.
    UnknownSelector,
    /// Two per-time-group sequences of different length were combined.
    Shape,
    /// Division by zero.
    Arithmetic,
}

impl fmt::Display for ExpressionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Syntax => "syntax error",
            Self::UnknownSelector => "unknown selector",
            Self::Shape => "shape mismatch",
            Self::Arithmetic => "arithmetic error",
        };
        f.write_str(label)
    }
}

/// Formula failure, raised as [`EngineError::Expression`].
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("Expression {kind}: {message}")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub message: String,
}

impl ExpressionError {
    pub fn new(kind: ExpressionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Syntax, message)
    }

    pub fn unknown_selector(message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::UnknownSelector, message)
    }
}
