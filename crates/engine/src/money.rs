//! Exact money arithmetic.
//!
//! Every amount handled by the engine is a [`BigRational`]. Values enter as
//! exact decimal strings (`"12.50"`) or fractions (`"1/3"`), are combined
//! without any loss, and are rounded **once**, when formatted for
//! presentation.
//!
//! # Examples
//!
//! ```rust
//! use engine::money::{format_amount, parse_amount};
//!
//! let third = parse_amount("1/3").unwrap();
//! assert_eq!(format_amount(&third, 2, 4), "0.3333");
//!
//! let price = parse_amount("10,5").unwrap();
//! assert_eq!(format_amount(&price, 2, 2), "10.50");
//! ```

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::{EngineError, ResultEngine};

/// Parses an exact amount.
///
/// Accepts an optional leading `+`/`-`, then either a decimal number (`.` or
/// `,` as decimal separator, any number of fractional digits) or a fraction
/// `numerator/denominator`.
pub fn parse_amount(s: &str) -> ResultEngine<BigRational> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped.trim_start())
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped.trim_start())
    } else {
        (false, trimmed)
    };
    if rest.is_empty() {
        return Err(empty());
    }

    let value = if let Some((numerator, denominator)) = rest.split_once('/') {
        let numerator = parse_digits(numerator.trim()).ok_or_else(invalid)?;
        let denominator = parse_digits(denominator.trim()).ok_or_else(invalid)?;
        if denominator.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "zero denominator: {s}"
            )));
        }
        BigRational::new(numerator, denominator)
    } else {
        let normalized = rest.replace(',', ".");
        let mut parts = normalized.split('.');
        let units = parts.next().ok_or_else(invalid)?;
        let fraction = parts.next().unwrap_or("");
        if parts.next().is_some() || units.is_empty() {
            return Err(invalid());
        }
        let digits = format!("{units}{fraction}");
        let mantissa = parse_digits(&digits).ok_or_else(invalid)?;
        let scale = u32::try_from(fraction.len()).map_err(|_| invalid())?;
        BigRational::new(mantissa, BigInt::from(10).pow(scale))
    };

    Ok(if negative { -value } else { value })
}

fn is_even(value: &BigInt) -> bool {
    (value % BigInt::from(2)).is_zero()
}

fn parse_digits(s: &str) -> Option<BigInt> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Rounds `value` to `scale` decimal places, half to even, returning the
/// scaled integer (`value * 10^scale`, rounded).
pub fn round_half_even(value: &BigRational, scale: u32) -> BigInt {
    let factor = BigRational::from_integer(BigInt::from(10).pow(scale));
    let scaled = value * factor;
    let floor = scaled.floor();
    let remainder = &scaled - &floor;
    let floor = floor.to_integer();
    let half = BigRational::new(BigInt::one(), BigInt::from(2));

    if remainder < half {
        floor
    } else if remainder > half || !is_even(&floor) {
        floor + BigInt::one()
    } else {
        floor
    }
}

/// Formats `value` with `maximum_scale` fractional digits (half to even),
/// then drops trailing zeros while more than `minimum_scale` digits remain.
pub fn format_amount(value: &BigRational, minimum_scale: u32, maximum_scale: u32) -> String {
    let minimum_scale = minimum_scale.min(maximum_scale);
    let rounded = round_half_even(value, maximum_scale);
    let sign = if rounded.is_negative() { "-" } else { "" };
    let digits = rounded.abs().to_string();

    let scale = maximum_scale as usize;
    if scale == 0 {
        return format!("{sign}{digits}");
    }

    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (units, fraction) = padded.split_at(padded.len() - scale);
    let keep = fraction.trim_end_matches('0').len().max(minimum_scale as usize);
    let fraction = &fraction[..keep];

    if fraction.is_empty() {
        format!("{sign}{units}")
    } else {
        format!("{sign}{units}.{fraction}")
    }
}

/// Text form used to store exact amounts (`"n"` or `"n/d"`).
pub fn to_stored(value: &BigRational) -> String {
    value.to_string()
}

/// Splits a net position (debits minus credits) onto its side: a positive
/// net is a debit amount, a negative one a credit amount.
pub fn split_net(net: &BigRational) -> (BigRational, BigRational) {
    if net.is_negative() {
        (BigRational::zero(), -net.clone())
    } else {
        (net.clone(), BigRational::zero())
    }
}
