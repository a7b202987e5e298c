//! Product Fixtures

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, INR, USD},
};
use serde::Deserialize;

use crate::{fixtures::FixtureError, pricing::round_to_money, products::Product};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of item id -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Product price (e.g., "450.00 INR")
    pub price: String,
}

impl TryFrom<ProductFixture> for Product<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&fixture.price)?;

        Ok(Product {
            name: fixture.name,
            price: Money::from_minor(minor_units, currency),
        })
    }
}

/// Parse price string (e.g., "450.00 INR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = match *currency_code {
        "INR" => INR,
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    let invalid = || FixtureError::InvalidPrice(s.to_string());

    let scale = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or_else(invalid)?;

    let minor = amount
        .parse::<Decimal>()
        .ok()
        .and_then(|value| value.checked_mul(scale))
        .ok_or_else(invalid)?;

    let price = round_to_money(minor, currency).map_err(|_err| invalid())?;

    Ok((price.to_minor_units(), currency))
}

/// Parse percentage string (e.g., "9%" or "0.09") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();
    let invalid = || FixtureError::InvalidPercentage(s.to_string());

    let value = match trimmed.strip_suffix('%') {
        Some(points) => points
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| invalid())?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(invalid)?,
        None => trimmed.parse::<Decimal>().map_err(|_err| invalid())?,
    };

    if value.is_sign_negative() {
        return Err(invalid());
    }

    Ok(Percentage::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_reads_rupees() -> Result<(), FixtureError> {
        let (minor, currency) = parse_price("450.50 INR")?;

        assert_eq!(minor, 45_050);
        assert_eq!(currency, INR);

        Ok(())
    }

    #[test]
    fn parse_price_rounds_half_away_from_zero() -> Result<(), FixtureError> {
        assert_eq!(parse_price("10.125 INR")?.0, 1_013);
        assert_eq!(parse_price("10.135 GBP")?.0, 1_014);
        assert_eq!(parse_price("-10.125 INR")?.0, -1_013);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("450INR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        assert_eq!(parse_percentage(" 9% ")?, Percentage::from(Decimal::new(9, 2)));
        assert_eq!(parse_percentage("0.09")?, Percentage::from(Decimal::new(9, 2)));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_negative_and_garbage() {
        assert!(matches!(
            parse_percentage("-5%"),
            Err(FixtureError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("lots"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }
}
