//! Tax
//!
//! Per-line tax under the company's tax configuration. Tax is always
//! calculated on the line's pre-discount subtotal; free lines therefore never
//! carry tax.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    orders::OrderLine,
    pricing::{PriceError, fraction, minor, percent_of, round_to_money, sum, zero},
};

/// Component names that apply to intra-state sales under GST.
const INTRA_STATE_COMPONENTS: [&str; 2] = ["CGST", "SGST"];

/// Component name that applies to inter-state sales under GST.
const INTER_STATE_COMPONENT: &str = "IGST";

/// Whether prices already contain tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingMode {
    /// Prices contain tax; tax is extracted backwards from the line subtotal
    Inclusive,

    /// Prices exclude tax; tax is added on top of the line subtotal
    #[default]
    Exclusive,
}

/// Company-wide tax configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxConfig {
    /// Whether tax is collected at all
    pub collect_tax: bool,

    /// Whether prices contain tax
    pub pricing_mode: PricingMode,

    /// Whether schedules are GST schedules (CGST + SGST, or IGST)
    pub is_gst: bool,
}

/// A customer's tax jurisdiction relative to the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jurisdiction {
    /// The customer is in the company's state. Only meaningful under GST.
    pub same_state: bool,
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Self { same_state: true }
    }
}

/// One named tax component of an item's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxComponent {
    /// Component name, e.g. "CGST"
    pub name: String,

    /// Component rate
    pub rate: Percentage,
}

impl TaxComponent {
    /// Create a new tax component.
    pub fn new(name: impl Into<String>, rate: Percentage) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// An item's tax schedule: its components, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaxSchedule {
    components: SmallVec<[TaxComponent; 3]>,
}

impl TaxSchedule {
    /// Create a schedule from its components.
    pub fn new(components: impl IntoIterator<Item = TaxComponent>) -> Self {
        Self {
            components: components.into_iter().collect(),
        }
    }

    /// Return the components in schedule order
    pub fn components(&self) -> &[TaxComponent] {
        &self.components
    }

    /// Check if the schedule has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Return the components that apply under `config` for `jurisdiction`,
    /// with same-named components merged into one.
    fn applicable(&self, config: &TaxConfig, jurisdiction: Jurisdiction) -> SmallVec<[TaxComponent; 3]> {
        let mut applicable: SmallVec<[TaxComponent; 3]> = SmallVec::new();

        let selected = self.components.iter().filter(|component| {
            if !config.is_gst {
                return true;
            }

            if jurisdiction.same_state {
                INTRA_STATE_COMPONENTS
                    .iter()
                    .any(|name| component.is_named(name))
            } else {
                component.is_named(INTER_STATE_COMPONENT)
            }
        });

        for component in selected {
            match applicable
                .iter_mut()
                .find(|existing| existing.is_named(&component.name))
            {
                Some(existing) => {
                    existing.rate =
                        Percentage::from(fraction(existing.rate) + fraction(component.rate));
                }
                None => applicable.push(TaxComponent::new(component.name.trim(), component.rate)),
            }
        }

        applicable
    }
}

/// Tax calculated for one line.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxBreakdown<'a> {
    mode: PricingMode,
    taxable: Money<'a, Currency>,
    total: Money<'a, Currency>,
    components: SmallVec<[(String, Money<'a, Currency>); 3]>,
}

impl<'a> TaxBreakdown<'a> {
    /// No tax on a line with subtotal `taxable`.
    pub fn none(taxable: Money<'a, Currency>, mode: PricingMode) -> Self {
        Self {
            mode,
            taxable,
            total: zero(taxable.currency()),
            components: SmallVec::new(),
        }
    }

    /// Return the pricing mode the tax was calculated under
    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    /// Return the line subtotal the tax was calculated on
    pub fn taxable(&self) -> &Money<'a, Currency> {
        &self.taxable
    }

    /// Return the total tax: the sum of the rounded component amounts
    pub fn total(&self) -> &Money<'a, Currency> {
        &self.total
    }

    /// Return `(component name, amount)` pairs in schedule order
    pub fn components(&self) -> &[(String, Money<'a, Currency>)] {
        &self.components
    }

    /// Return the amount for one component, matched case-insensitively.
    pub fn component(&self, name: &str) -> Option<&Money<'a, Currency>> {
        self.components
            .iter()
            .find(|(component, _)| component.eq_ignore_ascii_case(name.trim()))
            .map(|(_, amount)| amount)
    }

    /// Return whether the line carries no tax
    pub fn is_zero(&self) -> bool {
        self.total.to_minor_units() == 0
    }

    /// Return the line value net of tax.
    ///
    /// Under inclusive pricing this is `taxable - total`, so `net + total`
    /// always equals the taxable amount. Under exclusive pricing the taxable
    /// amount is already net.
    pub fn net(&self) -> Money<'a, Currency> {
        match self.mode {
            PricingMode::Inclusive => Money::from_minor(
                self.taxable
                    .to_minor_units()
                    .saturating_sub(self.total.to_minor_units()),
                self.taxable.currency(),
            ),
            PricingMode::Exclusive => self.taxable,
        }
    }
}

/// Calculate the tax for a single line.
///
/// Components are filtered by jurisdiction under GST, then:
///
/// - Exclusive: `amount_i = subtotal * rate_i`.
/// - Inclusive: `net = subtotal / (1 + R)`, and `subtotal - net` is split
///   across components in proportion to their rates.
///
/// Each component amount is rounded to the minor unit on its own, and the
/// total is the sum of the rounded components. A zero total rate yields zero
/// tax for every component.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the calculation leaves the minor-unit range.
pub fn compute_tax<'a>(
    line: &OrderLine<'a>,
    schedule: &TaxSchedule,
    config: &TaxConfig,
    jurisdiction: Jurisdiction,
) -> Result<TaxBreakdown<'a>, PriceError> {
    let taxable = line.subtotal()?;

    compute_tax_on(taxable, schedule, config, jurisdiction)
}

/// Calculate the tax on a line subtotal; see [`compute_tax`].
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the calculation leaves the minor-unit range.
pub fn compute_tax_on<'a>(
    taxable: Money<'a, Currency>,
    schedule: &TaxSchedule,
    config: &TaxConfig,
    jurisdiction: Jurisdiction,
) -> Result<TaxBreakdown<'a>, PriceError> {
    if !config.collect_tax {
        return Ok(TaxBreakdown::none(taxable, config.pricing_mode));
    }

    let currency = taxable.currency();
    let applicable = schedule.applicable(config, jurisdiction);
    let total_rate = applicable
        .iter()
        .try_fold(Decimal::ZERO, |acc, component| {
            acc.checked_add(fraction(component.rate))
        })
        .ok_or(PriceError::Overflow)?;

    let subtotal = minor(&taxable);

    let tax_pool = match config.pricing_mode {
        PricingMode::Exclusive => None,
        PricingMode::Inclusive if total_rate.is_zero() => Some(Decimal::ZERO),
        PricingMode::Inclusive => {
            let divisor = Decimal::ONE
                .checked_add(total_rate)
                .ok_or(PriceError::Overflow)?;
            let net = subtotal.checked_div(divisor).ok_or(PriceError::Overflow)?;

            Some(subtotal.checked_sub(net).ok_or(PriceError::Overflow)?)
        }
    };

    let components = applicable
        .iter()
        .map(|component| {
            let raw = component_amount(component.rate, total_rate, subtotal, tax_pool)?;

            Ok((component.name.clone(), round_to_money(raw, currency)?))
        })
        .collect::<Result<SmallVec<[(String, Money<'a, Currency>); 3]>, PriceError>>()?;

    let total = sum(components.iter().map(|(_, amount)| amount), currency)?;

    Ok(TaxBreakdown {
        mode: config.pricing_mode,
        taxable,
        total,
        components,
    })
}

/// Unrounded amount for one component.
///
/// `tax_pool` is the inclusive tax to distribute, or `None` under exclusive pricing.
fn component_amount(
    rate: Percentage,
    total_rate: Decimal,
    subtotal: Decimal,
    tax_pool: Option<Decimal>,
) -> Result<Decimal, PriceError> {
    match tax_pool {
        None => percent_of(rate, subtotal),
        Some(_) if total_rate.is_zero() => Ok(Decimal::ZERO),
        Some(pool) => pool
            .checked_mul(fraction(rate))
            .and_then(|share| share.checked_div(total_rate))
            .ok_or(PriceError::Overflow),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use crate::pricing::percent_points;

    use super::*;

    fn gst_schedule() -> TaxSchedule {
        TaxSchedule::new([
            TaxComponent::new("CGST", percent_points(Decimal::from(9))),
            TaxComponent::new("SGST", percent_points(Decimal::from(9))),
            TaxComponent::new("IGST", percent_points(Decimal::from(18))),
        ])
    }

    fn gst(mode: PricingMode) -> TaxConfig {
        TaxConfig {
            collect_tax: true,
            pricing_mode: mode,
            is_gst: true,
        }
    }

    fn hundred_rupees() -> Money<'static, Currency> {
        Money::from_minor(10_000, INR)
    }

    #[test]
    fn no_collection_means_no_tax() -> TestResult {
        let config = TaxConfig {
            collect_tax: false,
            ..gst(PricingMode::Exclusive)
        };

        let tax = compute_tax_on(hundred_rupees(), &gst_schedule(), &config, Jurisdiction::default())?;

        assert!(tax.is_zero());
        assert!(tax.components().is_empty());

        Ok(())
    }

    #[test]
    fn exclusive_intra_state_splits_cgst_and_sgst() -> TestResult {
        let tax = compute_tax_on(
            hundred_rupees(),
            &gst_schedule(),
            &gst(PricingMode::Exclusive),
            Jurisdiction { same_state: true },
        )?;

        assert_eq!(tax.total(), &Money::from_minor(1_800, INR));
        assert_eq!(tax.component("CGST"), Some(&Money::from_minor(900, INR)));
        assert_eq!(tax.component("SGST"), Some(&Money::from_minor(900, INR)));
        assert_eq!(tax.component("IGST"), None);
        assert_eq!(tax.net(), hundred_rupees());

        Ok(())
    }

    #[test]
    fn exclusive_inter_state_uses_igst_only() -> TestResult {
        let tax = compute_tax_on(
            hundred_rupees(),
            &gst_schedule(),
            &gst(PricingMode::Exclusive),
            Jurisdiction { same_state: false },
        )?;

        assert_eq!(tax.components().len(), 1);
        assert_eq!(tax.component("igst"), Some(&Money::from_minor(1_800, INR)));

        Ok(())
    }

    #[test]
    fn inclusive_extracts_tax_and_splits_proportionally() -> TestResult {
        let tax = compute_tax_on(
            hundred_rupees(),
            &gst_schedule(),
            &gst(PricingMode::Inclusive),
            Jurisdiction { same_state: true },
        )?;

        // 100 / 1.18 = 84.7458; 15.2542 split 50/50 is 7.6271 each
        assert_eq!(tax.component("CGST"), Some(&Money::from_minor(763, INR)));
        assert_eq!(tax.component("SGST"), Some(&Money::from_minor(763, INR)));
        assert_eq!(tax.total(), &Money::from_minor(1_526, INR));
        assert_eq!(
            tax.net().to_minor_units() + tax.total().to_minor_units(),
            10_000
        );

        Ok(())
    }

    #[test]
    fn non_gst_schedule_applies_every_component() -> TestResult {
        let schedule = TaxSchedule::new([
            TaxComponent::new("VAT", percent_points(Decimal::from(20))),
            TaxComponent::new("Service", percent_points(Decimal::from(5))),
        ]);

        let config = TaxConfig {
            collect_tax: true,
            pricing_mode: PricingMode::Exclusive,
            is_gst: false,
        };

        let tax = compute_tax_on(hundred_rupees(), &schedule, &config, Jurisdiction { same_state: false })?;

        assert_eq!(tax.total(), &Money::from_minor(2_500, INR));
        assert_eq!(tax.components().len(), 2);

        Ok(())
    }

    #[test]
    fn gst_names_match_case_insensitively() -> TestResult {
        let schedule = TaxSchedule::new([
            TaxComponent::new(" cgst ", percent_points(Decimal::from(6))),
            TaxComponent::new("Sgst", percent_points(Decimal::from(6))),
        ]);

        let tax = compute_tax_on(
            hundred_rupees(),
            &schedule,
            &gst(PricingMode::Exclusive),
            Jurisdiction::default(),
        )?;

        assert_eq!(tax.total(), &Money::from_minor(1_200, INR));
        assert_eq!(tax.component("CGST"), Some(&Money::from_minor(600, INR)));

        Ok(())
    }

    #[test]
    fn duplicate_components_are_merged() -> TestResult {
        let schedule = TaxSchedule::new([
            TaxComponent::new("CGST", percent_points(Decimal::from(5))),
            TaxComponent::new("CGST", percent_points(Decimal::from(4))),
        ]);

        let tax = compute_tax_on(
            hundred_rupees(),
            &schedule,
            &gst(PricingMode::Exclusive),
            Jurisdiction::default(),
        )?;

        assert_eq!(tax.components().len(), 1);
        assert_eq!(tax.component("CGST"), Some(&Money::from_minor(900, INR)));

        Ok(())
    }

    #[test]
    fn zero_total_rate_gives_zero_tax() -> TestResult {
        let schedule = TaxSchedule::new([TaxComponent::new("CGST", percent_points(Decimal::ZERO))]);

        let tax = compute_tax_on(
            hundred_rupees(),
            &schedule,
            &gst(PricingMode::Inclusive),
            Jurisdiction::default(),
        )?;

        assert!(tax.is_zero());
        assert_eq!(tax.component("CGST"), Some(&Money::from_minor(0, INR)));
        assert_eq!(tax.net(), hundred_rupees());

        Ok(())
    }

    #[test]
    fn schedule_without_matching_components_gives_zero_tax() -> TestResult {
        let schedule = TaxSchedule::new([TaxComponent::new("IGST", percent_points(Decimal::from(18)))]);

        let tax = compute_tax_on(
            hundred_rupees(),
            &schedule,
            &gst(PricingMode::Exclusive),
            Jurisdiction { same_state: true },
        )?;

        assert!(tax.is_zero());
        assert!(tax.components().is_empty());

        Ok(())
    }

    #[test]
    fn tax_uses_pre_discount_subtotal() -> TestResult {
        let line = OrderLine::new("haircut", "Haircut", hundred_rupees(), 1)?
            .with_discount(Money::from_minor(5_000, INR), "half-off".into())?;

        let tax = compute_tax(
            &line,
            &gst_schedule(),
            &gst(PricingMode::Exclusive),
            Jurisdiction::default(),
        )?;

        assert_eq!(tax.taxable(), &hundred_rupees());
        assert_eq!(tax.total(), &Money::from_minor(1_800, INR));

        Ok(())
    }

    #[test]
    fn rounded_components_stay_within_a_minor_unit_each() -> TestResult {
        let schedule = TaxSchedule::new([
            TaxComponent::new("CGST", percent_points(Decimal::new(25, 1))),
            TaxComponent::new("SGST", percent_points(Decimal::new(25, 1))),
        ]);

        let taxable = Money::from_minor(3_333, INR);
        let tax = compute_tax_on(
            taxable,
            &schedule,
            &gst(PricingMode::Inclusive),
            Jurisdiction::default(),
        )?;

        let exact = Decimal::from(3_333) - Decimal::from(3_333) / Decimal::new(105, 2);
        let drift = (Decimal::from(tax.total().to_minor_units()) - exact).abs();

        assert!(drift <= Decimal::from(2));

        Ok(())
    }
}
