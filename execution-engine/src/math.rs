//! Checked decimal helpers with explicit scale and rounding.
//!
//! Every division in the rule chain and the Ledger goes through here so that
//! a zero divisor or an overflow becomes an error instead of a panic.

use crate::error::ArithmeticError;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ArithmeticError> {
    a.checked_mul(b).ok_or(ArithmeticError::Overflow(what))
}

pub fn add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow(what))
}

pub fn sub(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ArithmeticError> {
    a.checked_sub(b).ok_or(ArithmeticError::Overflow(what))
}

fn div_round(
    numerator: Decimal,
    denominator: Decimal,
    dp: u32,
    strategy: RoundingStrategy,
    what: &'static str,
) -> Result<Decimal, ArithmeticError> {
    if denominator.is_zero() {
        return Err(ArithmeticError::DivisionByZero(what));
    }
    numerator
        .checked_div(denominator)
        .map(|q| q.round_dp_with_strategy(dp, strategy))
        .ok_or(ArithmeticError::Overflow(what))
}

/// `numerator / denominator` truncated toward zero at `dp` places.
pub fn div_down(
    numerator: Decimal,
    denominator: Decimal,
    dp: u32,
    what: &'static str,
) -> Result<Decimal, ArithmeticError> {
    div_round(numerator, denominator, dp, RoundingStrategy::ToZero, what)
}

/// `numerator / denominator` rounded half away from zero at `dp` places.
pub fn div_half_up(
    numerator: Decimal,
    denominator: Decimal,
    dp: u32,
    what: &'static str,
) -> Result<Decimal, ArithmeticError> {
    div_round(
        numerator,
        denominator,
        dp,
        RoundingStrategy::MidpointAwayFromZero,
        what,
    )
}

/// Largest multiple of `step` not exceeding `quantity` in magnitude.
pub fn align_to_step(quantity: Decimal, step: Decimal) -> Result<Decimal, ArithmeticError> {
    if step.is_zero() {
        return Err(ArithmeticError::DivisionByZero("quantity step"));
    }
    let lots = quantity
        .checked_div(step)
        .ok_or(ArithmeticError::Overflow("quantity step"))?
        .trunc();
    mul(lots, step, "quantity step")
}

/// Rounds half away from zero to `dp` places, for display percentages.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
