//! Pricing Engine
//!
//! The single entry point that prices an order: fetch reference data, resolve
//! promotions, calculate tax per line, then aggregate totals. Every pass starts
//! from the purchased lines, so pricing an already priced order gives the same
//! result.

use jiff::{Timestamp, tz::TimeZone};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    ids::{CustomerId, ItemId},
    orders::{Order, OrderLine},
    products::ItemNames,
    promotions::{catalog::PromotionCatalog, resolver::PromotionResolver},
    source::{PricingSource, SourceError},
    tax::{Jurisdiction, PricingMode, TaxBreakdown, TaxConfig, TaxSchedule, compute_tax},
    totals::{OrderAdjustments, Totals, TotalsError, aggregate},
};

/// Errors that stop a pricing pass.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Reference data could not be fetched.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Totals could not be aggregated.
    #[error(transparent)]
    Totals(#[from] TotalsError),
}

/// A fully priced order.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder<'a> {
    order: Order<'a>,
    taxes: Vec<TaxBreakdown<'a>>,
    totals: Totals<'a>,
}

impl<'a> PricedOrder<'a> {
    /// Return the resolved order: discounted purchased lines, then free lines.
    pub fn order(&self) -> &Order<'a> {
        &self.order
    }

    /// Return the tax for each line, in line order.
    pub fn taxes(&self) -> &[TaxBreakdown<'a>] {
        &self.taxes
    }

    /// Iterate over each line with its tax.
    pub fn lines(&self) -> impl Iterator<Item = (&OrderLine<'a>, &TaxBreakdown<'a>)> {
        self.order.iter().zip(self.taxes.iter())
    }

    /// Return the order totals.
    pub fn totals(&self) -> &Totals<'a> {
        &self.totals
    }
}

/// Prices orders against a [`PricingSource`].
#[derive(Debug)]
pub struct PricingEngine<S> {
    source: S,
    time_zone: TimeZone,
}

impl<S: PricingSource> PricingEngine<S> {
    /// Create an engine that reads promotion dates in UTC.
    pub fn new(source: S) -> Self {
        Self {
            source,
            time_zone: TimeZone::UTC,
        }
    }

    /// Read date-only promotion bounds in `time_zone` instead of UTC.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Return the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Price an order at `now`.
    ///
    /// `customer` is `None` for walk-in sales; walk-ins, and customers with no
    /// recorded jurisdiction, are taxed as intra-state.
    ///
    /// Bad reference records never fail the pass. Malformed promotions are
    /// excluded, unknown free items are named by id, and a line with no
    /// usable tax schedule carries no tax.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the promotion list, tax configuration or
    /// customer can't be fetched, or the totals can't be aggregated.
    #[tracing::instrument(
        name = "pricing.engine.price_order",
        skip_all,
        fields(
            lines = order.len(),
            customer = customer.map(CustomerId::as_str),
            grand_total = tracing::field::Empty,
        ),
        err
    )]
    pub fn price_order<'a>(
        &self,
        order: &Order<'a>,
        customer: Option<&CustomerId>,
        adjustments: &OrderAdjustments<'a>,
        now: Timestamp,
    ) -> Result<PricedOrder<'a>, PricingError> {
        let records = self.source.active_promotions()?;
        let catalog = PromotionCatalog::from_records(&records, order.currency(), &self.time_zone);
        let active = catalog.active(now);

        let names = SourceNames(&self.source);
        let resolved = PromotionResolver::new(&active, &names).resolve(order);

        let config = self.source.company_tax_config()?;
        let jurisdiction = self.jurisdiction(customer, &config)?;
        let taxes = self.line_taxes(&resolved, &config, jurisdiction);

        let totals = aggregate(&resolved, &taxes, adjustments)?;

        tracing::Span::current().record("grand_total", totals.grand_total().to_minor_units());

        Ok(PricedOrder {
            order: resolved,
            taxes,
            totals,
        })
    }

    /// Return the jurisdiction to tax under. Only GST cares, so the customer
    /// is only fetched when tax is collected under GST.
    fn jurisdiction(
        &self,
        customer: Option<&CustomerId>,
        config: &TaxConfig,
    ) -> Result<Jurisdiction, SourceError> {
        if !(config.collect_tax && config.is_gst) {
            return Ok(Jurisdiction::default());
        }

        let Some(customer) = customer else {
            debug!("walk-in customer; taxing as intra-state");

            return Ok(Jurisdiction::default());
        };

        Ok(self
            .source
            .customer_jurisdiction(customer)?
            .unwrap_or_else(|| {
                debug!(customer_id = %customer, "no jurisdiction recorded; taxing as intra-state");

                Jurisdiction::default()
            }))
    }

    fn line_taxes<'a>(
        &self,
        order: &Order<'a>,
        config: &TaxConfig,
        jurisdiction: Jurisdiction,
    ) -> Vec<TaxBreakdown<'a>> {
        let mut schedules: FxHashMap<&ItemId, Option<TaxSchedule>> = FxHashMap::default();

        order
            .iter()
            .map(|line| {
                if !config.collect_tax || line.is_free() {
                    return untaxed(line, config.pricing_mode);
                }

                let schedule = schedules
                    .entry(line.item_id())
                    .or_insert_with(|| self.tax_schedule(line.item_id()));

                let Some(schedule) = schedule else {
                    return untaxed(line, config.pricing_mode);
                };

                compute_tax(line, schedule, config, jurisdiction).unwrap_or_else(|error| {
                    warn!(item_id = %line.item_id(), %error, "tax calculation overflowed; line untaxed");

                    untaxed(line, config.pricing_mode)
                })
            })
            .collect()
    }

    fn tax_schedule(&self, item: &ItemId) -> Option<TaxSchedule> {
        match self.source.item_tax_schedule(item) {
            Ok(Some(schedule)) => Some(schedule),
            Ok(None) => {
                warn!(item_id = %item, "no tax schedule; line untaxed");

                None
            }
            Err(error) => {
                warn!(item_id = %item, %error, "tax schedule unavailable; line untaxed");

                None
            }
        }
    }
}

fn untaxed<'a>(line: &OrderLine<'a>, mode: PricingMode) -> TaxBreakdown<'a> {
    TaxBreakdown::none(
        line.subtotal().unwrap_or(*line.discounted_subtotal()),
        mode,
    )
}

/// Names free lines through the source, falling back to the raw id on failure.
struct SourceNames<'s, S>(&'s S);

impl<S: PricingSource> ItemNames for SourceNames<'_, S> {
    fn item_name(&self, item: &ItemId) -> Option<String> {
        self.0.item_name(item).unwrap_or_else(|error| {
            warn!(item_id = %item, %error, "item name unavailable");

            None
        })
    }
}
