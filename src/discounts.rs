//! Discounts
//!
//! The per-line discount formula shared by Global and item-specific discount
//! promotions.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::pricing::{PriceError, line_subtotal_minor, minor, percent_of, round_to_money};

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor-unit arithmetic overflowed.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// A fixed discount is priced in a different currency to the line (discount currency, line currency).
    #[error("discount has currency {0}, but line has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),
}

/// Discount configuration for a discount promotion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DiscountValue<'a> {
    /// Take a percentage off the line (e.g., "10% off")
    Percentage(Percentage),

    /// Take a fixed amount off every unit, capped at the unit price (e.g., "₹150 off")
    Fixed(Money<'a, Currency>),
}

/// Calculate the discount amount for a line of `quantity` units at `unit_price`.
///
/// - Percentage: `unit_price * quantity * rate`.
/// - Fixed: `min(amount, unit_price) * quantity`; the fixed amount never takes
///   more than one unit's price off each unit.
///
/// The result is rounded to the minor unit and never exceeds the line subtotal.
///
/// # Errors
///
/// Returns a [`DiscountError`] if:
/// - the fixed amount is in a different currency to the line (`DiscountError::CurrencyMismatch`).
/// - the calculation overflows (`DiscountError::Price` / `DiscountError::PercentConversion`).
pub fn discount_amount<'a>(
    value: &DiscountValue<'_>,
    unit_price: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = unit_price.currency();
    let subtotal = line_subtotal_minor(unit_price, quantity)?;

    let amount = match value {
        DiscountValue::Percentage(percent) => {
            percent_of(*percent, subtotal).map_err(|_err| DiscountError::PercentConversion)?
        }
        DiscountValue::Fixed(amount) => {
            if amount.currency() != currency {
                return Err(DiscountError::CurrencyMismatch(
                    amount.currency().iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            minor(amount)
                .min(minor(unit_price))
                .max(Decimal::ZERO)
                .checked_mul(Decimal::from(quantity))
                .ok_or(PriceError::Overflow)?
        }
    };

    let capped = amount.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO));

    Ok(round_to_money(capped, currency)?)
}
