//! Promotion Catalog
//!
//! Point-in-time snapshot of the stored promotions. Filtering by status and
//! window happens on every pricing pass, so a promotion that expires mid
//! session stops applying on the next recompute.

use jiff::{Timestamp, tz::TimeZone};
use rusty_money::iso::Currency;
use tracing::{debug, warn};

use crate::promotions::{Promotion, records::PromotionRecord};

/// Promotions parsed from storage, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct PromotionCatalog<'a> {
    promotions: Vec<Promotion<'a>>,
    rejected: usize,
}

impl<'a> PromotionCatalog<'a> {
    /// Create a catalog from already validated promotions.
    pub fn new(promotions: impl Into<Vec<Promotion<'a>>>) -> Self {
        Self {
            promotions: promotions.into(),
            rejected: 0,
        }
    }

    /// Build a catalog from stored records.
    ///
    /// Records that don't describe a valid promotion are logged and left out.
    pub fn from_records(
        records: &[PromotionRecord],
        currency: &'a Currency,
        time_zone: &TimeZone,
    ) -> Self {
        let mut promotions = Vec::with_capacity(records.len());
        let mut rejected = 0;

        for record in records {
            match Promotion::try_from_record(record, currency, time_zone) {
                Ok(promotion) => promotions.push(promotion),
                Err(error) => {
                    rejected += 1;

                    warn!(promotion_id = %record.id, %error, "excluding malformed promotion");
                }
            }
        }

        Self {
            promotions,
            rejected,
        }
    }

    /// Return the promotions active at `now`, in catalog order.
    #[tracing::instrument(
        name = "pricing.catalog.active",
        skip(self),
        fields(total = tracing::field::Empty, active = tracing::field::Empty)
    )]
    pub fn active(&self, now: Timestamp) -> ActivePromotions<'a> {
        let active: Vec<Promotion<'a>> = self
            .promotions
            .iter()
            .filter(|promotion| promotion.is_active_at(now))
            .cloned()
            .collect();

        let span = tracing::Span::current();

        span.record("total", self.promotions.len());
        span.record("active", active.len());

        debug!(active = active.len(), "filtered active promotions");

        ActivePromotions { promotions: active }
    }

    /// Return every valid promotion, active or not.
    pub fn promotions(&self) -> &[Promotion<'a>] {
        &self.promotions
    }

    /// Return how many stored records were rejected as malformed.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Get the number of valid promotions.
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

/// Promotions active at one instant, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct ActivePromotions<'a> {
    promotions: Vec<Promotion<'a>>,
}

impl<'a> ActivePromotions<'a> {
    /// Create a snapshot with no promotions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Iterate over the active promotions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Promotion<'a>> {
        self.promotions.iter()
    }

    /// Get the number of active promotions.
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Check if no promotions are active.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}
