//! Totals
//!
//! Combines resolved lines, per-line tax and the manual order-level
//! adjustments into the order's financial totals.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    orders::Order,
    pricing::{PriceError, minor, percent_of, round_to_money, sum, zero},
    tax::{PricingMode, TaxBreakdown},
};

/// Errors that can occur when aggregating order totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// Minor-unit arithmetic overflowed.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// An amount is in a different currency to the order (amount currency, order currency).
    #[error("Amount has currency {0}, but order has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// An order-level adjustment was negative.
    #[error("Order {0} must not be negative")]
    NegativeAdjustment(&'static str),

    /// The number of tax results doesn't match the number of lines (taxes, lines).
    #[error("Got {0} tax results for {1} lines")]
    TaxCount(usize, usize),
}

/// A manual order-level discount, charge or tip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment<'a> {
    /// A fixed amount
    Amount(Money<'a, Currency>),

    /// A percentage of the order subtotal
    Percentage(Percentage),
}

impl<'a> Adjustment<'a> {
    /// Resolve the adjustment to an amount against `subtotal`.
    ///
    /// Percentages are always taken of the subtotal, never of a running total,
    /// so adjustments are independent of the order they're applied in.
    fn amount(
        &self,
        subtotal: &Money<'a, Currency>,
        label: &'static str,
    ) -> Result<Money<'a, Currency>, TotalsError> {
        let currency = subtotal.currency();

        let amount = match self {
            Adjustment::Amount(amount) => {
                if amount.currency() != currency {
                    return Err(TotalsError::CurrencyMismatch(
                        amount.currency().iso_alpha_code,
                        currency.iso_alpha_code,
                    ));
                }

                *amount
            }
            Adjustment::Percentage(percent) => {
                round_to_money(percent_of(*percent, minor(subtotal))?, currency)?
            }
        };

        if amount.to_minor_units() < 0 {
            return Err(TotalsError::NegativeAdjustment(label));
        }

        Ok(amount)
    }
}

/// Manual adjustments entered at the till.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderAdjustments<'a> {
    /// Order-level discount, capped at the subtotal
    pub discount: Option<Adjustment<'a>>,

    /// Order-level service charge
    pub charge: Option<Adjustment<'a>>,

    /// Tips
    pub tips: Option<Adjustment<'a>>,
}

impl OrderAdjustments<'_> {
    /// No adjustments.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Financial totals of a priced order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals<'a> {
    subtotal: Money<'a, Currency>,
    line_discount_total: Money<'a, Currency>,
    order_discount: Money<'a, Currency>,
    charge: Money<'a, Currency>,
    tips: Money<'a, Currency>,
    tax_total: Money<'a, Currency>,
    grand_total: Money<'a, Currency>,
}

impl<'a> Totals<'a> {
    /// Sum of discounted line subtotals over purchased lines
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Sum of per-line promotion discounts, already folded into the subtotal
    pub fn line_discount_total(&self) -> Money<'a, Currency> {
        self.line_discount_total
    }

    /// Order-level discount actually taken
    pub fn order_discount(&self) -> Money<'a, Currency> {
        self.order_discount
    }

    /// Order-level service charge
    pub fn charge(&self) -> Money<'a, Currency> {
        self.charge
    }

    /// Tips
    pub fn tips(&self) -> Money<'a, Currency> {
        self.tips
    }

    /// Sum of all line tax, inclusive or exclusive
    pub fn tax_total(&self) -> Money<'a, Currency> {
        self.tax_total
    }

    /// Amount payable
    pub fn grand_total(&self) -> Money<'a, Currency> {
        self.grand_total
    }

    /// Total taken off by promotions and the order-level discount.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Price`] if the sum overflows.
    pub fn savings(&self) -> Result<Money<'a, Currency>, TotalsError> {
        Ok(sum(
            [&self.line_discount_total, &self.order_discount],
            self.subtotal.currency(),
        )?)
    }

    /// Savings as a fraction of the pre-discount subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Price`] if the sums overflow.
    pub fn savings_percent(&self) -> Result<Percentage, TotalsError> {
        let savings = minor(&self.savings()?);
        let gross = minor(&self.subtotal)
            .checked_add(minor(&self.line_discount_total))
            .ok_or(PriceError::Overflow)?;

        if gross.is_zero() {
            return Ok(Percentage::from(Decimal::ZERO));
        }

        Ok(Percentage::from(savings / gross))
    }
}

/// Aggregate an order's totals.
///
/// `taxes` holds one result per order line, in line order.
///
/// - `subtotal = Σ discounted_subtotal` over purchased lines.
/// - `tax_total = Σ line tax`.
/// - `grand_total = subtotal - order discount + exclusive tax + charge + tips`.
///
/// Inclusive tax is already part of the subtotal, so only tax calculated
/// under [`PricingMode::Exclusive`] is added to the grand total.
///
/// # Errors
///
/// Returns a [`TotalsError`] if the amounts don't share the order currency,
/// an adjustment is negative, or a sum overflows.
pub fn aggregate<'a>(
    order: &Order<'a>,
    taxes: &[TaxBreakdown<'a>],
    adjustments: &OrderAdjustments<'a>,
) -> Result<Totals<'a>, TotalsError> {
    let currency = order.currency();

    if taxes.len() != order.len() {
        return Err(TotalsError::TaxCount(taxes.len(), order.len()));
    }

    if let Some(tax) = taxes.iter().find(|tax| tax.total().currency() != currency) {
        return Err(TotalsError::CurrencyMismatch(
            tax.total().currency().iso_alpha_code,
            currency.iso_alpha_code,
        ));
    }

    let subtotal = sum(
        order.purchased_lines().map(|line| line.discounted_subtotal()),
        currency,
    )?;

    let line_discount_total = sum(
        order.purchased_lines().map(|line| line.discount_amount()),
        currency,
    )?;

    let tax_total = sum(taxes.iter().map(TaxBreakdown::total), currency)?;

    let exclusive_tax = sum(
        taxes
            .iter()
            .filter(|tax| tax.mode() == PricingMode::Exclusive)
            .map(TaxBreakdown::total),
        currency,
    )?;

    let resolve = |adjustment: Option<&Adjustment<'a>>, label| {
        adjustment.map_or(Ok(zero(currency)), |adjustment| {
            adjustment.amount(&subtotal, label)
        })
    };

    let requested_discount = resolve(adjustments.discount.as_ref(), "discount")?;
    let charge = resolve(adjustments.charge.as_ref(), "charge")?;
    let tips = resolve(adjustments.tips.as_ref(), "tips")?;

    let order_discount = Money::from_minor(
        requested_discount
            .to_minor_units()
            .min(subtotal.to_minor_units().max(0)),
        currency,
    );

    let grand_total = subtotal
        .to_minor_units()
        .checked_sub(order_discount.to_minor_units())
        .and_then(|total| total.checked_add(exclusive_tax.to_minor_units()))
        .and_then(|total| total.checked_add(charge.to_minor_units()))
        .and_then(|total| total.checked_add(tips.to_minor_units()))
        .ok_or(PriceError::Overflow)?;

    Ok(Totals {
        subtotal,
        line_discount_total,
        order_discount,
        charge,
        tips,
        tax_total,
        grand_total: Money::from_minor(grand_total, currency),
    })
}
