//! Prices
//!
//! Minor-unit money helpers shared by the discount, tax and totals
//! calculations. All intermediate arithmetic happens in [`Decimal`] minor
//! units; results are rounded back to whole minor units half away from zero.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors raised by minor-unit arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// A calculation left the representable minor-unit range.
    #[error("price calculation overflowed")]
    Overflow,
}

/// Return the amount of `money` in minor units as a [`Decimal`].
pub fn minor(money: &Money<'_, Currency>) -> Decimal {
    Decimal::from(money.to_minor_units())
}

/// Round a minor-unit amount to a whole minor unit and wrap it as money.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the rounded amount does not fit an `i64`.
pub fn round_to_money<'a>(
    amount: Decimal,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PriceError> {
    let rounded = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PriceError::Overflow)?;

    Ok(Money::from_minor(rounded, currency))
}

/// Return the zero amount in `currency`.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Return `unit_price * quantity` in minor units.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the product does not fit.
pub fn line_subtotal_minor(
    unit_price: &Money<'_, Currency>,
    quantity: u32,
) -> Result<Decimal, PriceError> {
    minor(unit_price)
        .checked_mul(Decimal::from(quantity))
        .ok_or(PriceError::Overflow)
}

/// Return the fraction held by a percentage (`10%` is `0.10`).
pub fn fraction(percent: Percentage) -> Decimal {
    // decimal_percentage doesn't expose the underlying Decimal
    percent * Decimal::ONE
}

/// Build a percentage from percent points (`10` is `10%`).
pub fn percent_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Return `percent` of a minor-unit amount, unrounded.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the multiplication overflows.
pub fn percent_of(percent: Percentage, amount: Decimal) -> Result<Decimal, PriceError> {
    fraction(percent)
        .checked_mul(amount)
        .ok_or(PriceError::Overflow)
}

/// Sum money amounts of the same currency.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the sum does not fit an `i64`.
pub fn sum<'a, 'm>(
    amounts: impl IntoIterator<Item = &'m Money<'a, Currency>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PriceError>
where
    'a: 'm,
{
    let total = amounts.into_iter().try_fold(0_i64, |acc, amount| {
        acc.checked_add(amount.to_minor_units())
            .ok_or(PriceError::Overflow)
    })?;

    Ok(Money::from_minor(total, currency))
}
