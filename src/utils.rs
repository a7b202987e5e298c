//! Utils

use clap::Parser;
use jiff::{Timestamp, tz::TimeZone};
use rusty_money::{Money, iso::Currency};

use crate::{
    fixtures::{
        FixtureError,
        products::{parse_percentage, parse_price},
    },
    totals::{Adjustment, OrderAdjustments},
};

/// Arguments for the pricing demo
#[derive(Debug, Parser)]
pub struct PriceOrderArgs {
    /// Fixture set to load products, tax, promotions, customers and orders from
    #[clap(short, long, default_value = "salon")]
    pub fixture: String,

    /// Named order from the fixture set
    #[clap(short, long, default_value = "walk-in")]
    pub order: String,

    /// Customer id, overriding the order's customer
    #[clap(short, long)]
    pub customer: Option<String>,

    /// Instant to price at (RFC 3339); defaults to now
    #[clap(short, long)]
    pub at: Option<String>,

    /// IANA time zone used to read date-only promotion bounds
    #[clap(short, long, default_value = "UTC")]
    pub time_zone: String,

    /// Order-level discount (e.g., "10%" or "150.00 INR")
    #[clap(long)]
    pub discount: Option<String>,

    /// Order-level service charge (e.g., "5%" or "50.00 INR")
    #[clap(long)]
    pub charge: Option<String>,

    /// Tips (e.g., "100.00 INR")
    #[clap(long)]
    pub tips: Option<String>,
}

impl PriceOrderArgs {
    /// Return the pricing instant.
    ///
    /// # Errors
    ///
    /// Returns an error if `--at` isn't an RFC 3339 instant.
    pub fn now(&self) -> Result<Timestamp, jiff::Error> {
        self.at
            .as_deref()
            .map_or_else(|| Ok(Timestamp::now()), |at| at.parse())
    }

    /// Return the time zone for date-only promotion bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the time zone isn't known.
    pub fn time_zone(&self) -> Result<TimeZone, jiff::Error> {
        TimeZone::get(&self.time_zone)
    }

    /// Return the order-level adjustments.
    ///
    /// # Errors
    ///
    /// Returns an error if an adjustment is neither a percentage nor a price.
    pub fn adjustments(&self) -> Result<OrderAdjustments<'static>, FixtureError> {
        Ok(OrderAdjustments {
            discount: self.discount.as_deref().map(parse_adjustment).transpose()?,
            charge: self.charge.as_deref().map(parse_adjustment).transpose()?,
            tips: self.tips.as_deref().map(parse_adjustment).transpose()?,
        })
    }
}

/// Parse an adjustment: a percentage ("10%") or a price ("150.00 INR").
///
/// # Errors
///
/// Returns an error if the value is neither.
pub fn parse_adjustment(s: &str) -> Result<Adjustment<'static>, FixtureError> {
    if s.trim().ends_with('%') {
        return Ok(Adjustment::Percentage(parse_percentage(s)?));
    }

    let (minor_units, currency): (i64, &'static Currency) = parse_price(s)?;

    Ok(Adjustment::Amount(Money::from_minor(minor_units, currency)))
}
