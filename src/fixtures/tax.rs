//! Tax Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, products::parse_percentage},
    tax::{PricingMode, TaxComponent, TaxConfig, TaxSchedule},
};

/// Wrapper for tax configuration and schedules in YAML
#[derive(Debug, Deserialize)]
pub struct TaxFixture {
    /// Company-wide configuration
    pub config: TaxConfigFixture,

    /// Map of item id -> schedule components
    #[serde(default)]
    pub schedules: FxHashMap<String, Vec<TaxComponentFixture>>,
}

/// Tax configuration fixture
#[derive(Debug, Deserialize)]
pub struct TaxConfigFixture {
    /// Whether tax is collected
    pub collect_tax: bool,

    /// Whether prices contain tax
    pub pricing_mode: PricingModeFixture,

    /// Whether schedules are GST schedules
    #[serde(default)]
    pub is_gst: bool,
}

/// Pricing mode fixture
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModeFixture {
    /// Prices contain tax
    Inclusive,

    /// Prices exclude tax
    Exclusive,
}

/// One tax component fixture
#[derive(Debug, Deserialize)]
pub struct TaxComponentFixture {
    /// Component name (e.g., "CGST")
    pub name: String,

    /// Component rate (e.g., "9%")
    pub rate: String,
}

impl From<TaxConfigFixture> for TaxConfig {
    fn from(fixture: TaxConfigFixture) -> Self {
        TaxConfig {
            collect_tax: fixture.collect_tax,
            pricing_mode: match fixture.pricing_mode {
                PricingModeFixture::Inclusive => PricingMode::Inclusive,
                PricingModeFixture::Exclusive => PricingMode::Exclusive,
            },
            is_gst: fixture.is_gst,
        }
    }
}

/// Convert schedule component fixtures into a [`TaxSchedule`]
///
/// # Errors
///
/// Returns an error if a component rate can't be parsed.
pub fn parse_schedule(components: &[TaxComponentFixture]) -> Result<TaxSchedule, FixtureError> {
    let components = components
        .iter()
        .map(|component| -> Result<TaxComponent, FixtureError> {
            Ok(TaxComponent::new(
                component.name.clone(),
                parse_percentage(&component.rate)?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaxSchedule::new(components))
}
