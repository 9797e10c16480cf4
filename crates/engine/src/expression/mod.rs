//! Report formulas.
//!
//! A formula combines aggregate amounts with `+ - * /` and exact literals:
//!
//! ```text
//! TOTAL_CLOSED_DEBIT_AMOUNT(COLLECTION[<id>]) * 2
//! TOTAL_UNADJUSTED_DEBIT_AMOUNT(EXPENSE_ACCOUNTS) - TOTAL_UNADJUSTED_CREDIT_AMOUNT(INCOME_ACCOUNTS)
//! ```
//!
//! [`MathExpression::evaluate`] yields one exact amount per time group of its
//! [`TimeGroupManager`]. A formula without aggregate calls is a scalar and is
//! broadcast to every time group. Every selector is resolved before the first
//! aggregate is computed, so an unknown selector fails without touching the
//! aggregator.

pub mod parser;

use std::collections::HashMap;

use num_rational::BigRational;
use num_traits::Zero;
use uuid::Uuid;

use crate::{
    AccountKind, ExpressionError, ExpressionErrorKind, ResultEngine, TimeGroupManager,
};

pub use parser::{AggregateFunction, BinaryOperator, Expr, Selector, parse_formula};

/// Account kinds behind each named selector.
pub fn macro_kinds(name: &str) -> Option<&'static [AccountKind]> {
    use AccountKind::*;

    let kinds: &'static [AccountKind] = match name {
        "ASSET_ACCOUNTS" => &[GeneralAsset, LiquidAsset, DepreciativeAsset, ItemizedAsset],
        "LIQUID_ASSET_ACCOUNTS" => &[LiquidAsset],
        "ITEMIZED_ASSET_ACCOUNTS" => &[ItemizedAsset],
        "DEPRECIATIVE_ASSET_ACCOUNTS" => &[DepreciativeAsset],
        "LIABILITY_ACCOUNTS" => &[Liability],
        "EQUITY_ACCOUNTS" => &[Equity],
        "INCOME_ACCOUNTS" => &[Income],
        "EXPENSE_ACCOUNTS" => &[Expense],
        "TEMPORARY_ACCOUNTS" => &[GeneralTemporary, NominalTemporary],
        "NOMINAL_RETURN_ACCOUNTS" => &[NominalReturn],
        _ => return None,
    };
    Some(kinds)
}

/// Intermediate value: a scalar, or one amount per time group.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Series {
    Scalar(BigRational),
    Groups(Vec<BigRational>),
}

pub struct MathExpression<'m, 'a> {
    manager: &'m mut TimeGroupManager<'a>,
}

impl<'m, 'a> MathExpression<'m, 'a> {
    pub fn new(manager: &'m mut TimeGroupManager<'a>) -> Self {
        Self { manager }
    }

    /// Evaluates `formula`, one result per time group.
    pub fn evaluate(&mut self, formula: &str) -> ResultEngine<Vec<BigRational>> {
        let expr = parse_formula(formula)?;
        let accounts = self.resolve_selectors(&expr)?;
        let value = self.evaluate_expr(&expr, &accounts)?;
        Ok(match value {
            Series::Scalar(value) => vec![value; self.manager.time_groups().len()],
            Series::Groups(values) => values,
        })
    }

    fn resolve_selectors(&self, expr: &Expr) -> ResultEngine<HashMap<Selector, Vec<Uuid>>> {
        let context = self.manager.context();
        let mut resolved = HashMap::new();
        for selector in expr.selectors() {
            if resolved.contains_key(selector) {
                continue;
            }
            let ids = match selector {
                Selector::Collection(raw) => {
                    let unknown = || {
                        ExpressionError::unknown_selector(format!("unknown collection '{raw}'"))
                    };
                    let collection_id = Uuid::parse_str(raw).map_err(|_| unknown())?;
                    context
                        .collection_account_ids(collection_id)?
                        .ok_or_else(unknown)?
                }
                Selector::Macro(name) => {
                    let kinds = macro_kinds(name).ok_or_else(|| {
                        ExpressionError::unknown_selector(format!("unknown account set '{name}'"))
                    })?;
                    context.account_ids_by_kinds(kinds)?
                }
            };
            resolved.insert(selector.clone(), ids);
        }
        Ok(resolved)
    }

    fn evaluate_expr(
        &mut self,
        expr: &Expr,
        accounts: &HashMap<Selector, Vec<Uuid>>,
    ) -> ResultEngine<Series> {
        match expr {
            Expr::Literal(value) => Ok(Series::Scalar(value.clone())),
            Expr::Negate(inner) => Ok(match self.evaluate_expr(inner, accounts)? {
                Series::Scalar(value) => Series::Scalar(-value),
                Series::Groups(values) => Series::Groups(values.into_iter().map(|v| -v).collect()),
            }),
            Expr::BinaryOp { op, left, right } => {
                let left = self.evaluate_expr(left, accounts)?;
                let right = self.evaluate_expr(right, accounts)?;
                Ok(combine(*op, left, right)?)
            }
            Expr::AggregateCall { function, selector } => {
                let ids = accounts.get(selector).map(Vec::as_slice).unwrap_or_default();
                let values = self.manager.total_amount(function.stage, function.side, ids)?;
                Ok(Series::Groups(values))
            }
        }
    }
}

fn combine(op: BinaryOperator, left: Series, right: Series) -> Result<Series, ExpressionError> {
    match (left, right) {
        (Series::Scalar(left), Series::Scalar(right)) => Ok(Series::Scalar(apply(op, &left, &right)?)),
        (Series::Scalar(left), Series::Groups(right)) => right
            .iter()
            .map(|value| apply(op, &left, value))
            .collect::<Result<_, _>>()
            .map(Series::Groups),
        (Series::Groups(left), Series::Scalar(right)) => left
            .iter()
            .map(|value| apply(op, value, &right))
            .collect::<Result<_, _>>()
            .map(Series::Groups),
        (Series::Groups(left), Series::Groups(right)) => {
            if left.len() != right.len() {
                return Err(ExpressionError::new(
                    ExpressionErrorKind::Shape,
                    format!("cannot combine {} values with {}", left.len(), right.len()),
                ));
            }
            left.iter()
                .zip(&right)
                .map(|(left, right)| apply(op, left, right))
                .collect::<Result<_, _>>()
                .map(Series::Groups)
        }
    }
}

fn apply(
    op: BinaryOperator,
    left: &BigRational,
    right: &BigRational,
) -> Result<BigRational, ExpressionError> {
    Ok(match op {
        BinaryOperator::Add => left + right,
        BinaryOperator::Subtract => left - right,
        BinaryOperator::Multiply => left * right,
        BinaryOperator::Divide => {
            if right.is_zero() {
                return Err(ExpressionError::new(
                    ExpressionErrorKind::Arithmetic,
                    "division by zero",
                ));
            }
            left / right
        }
    })
}
