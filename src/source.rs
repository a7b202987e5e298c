//! Pricing Source
//!
//! The data-access collaborator the engine fetches reference data from before
//! a pricing pass. Storage, transport and caching live behind this trait.

use std::error::Error as StdError;

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::{
    ids::{CustomerId, ItemId},
    promotions::records::PromotionRecord,
    tax::{Jurisdiction, TaxConfig, TaxSchedule},
};

/// Errors raised by a [`PricingSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The data could not be fetched.
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// The backing store failed.
    #[error("pricing source error")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

/// Reference data needed to price an order.
#[cfg_attr(test, automock)]
pub trait PricingSource {
    /// Return every stored promotion, unfiltered by status or date.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the promotions can't be fetched.
    fn active_promotions(&self) -> Result<Vec<PromotionRecord>, SourceError>;

    /// Return an item's tax schedule, or `None` if the item has none.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the schedule can't be fetched.
    fn item_tax_schedule(&self, item: &ItemId) -> Result<Option<TaxSchedule>, SourceError>;

    /// Return the company-wide tax configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the configuration can't be fetched.
    fn company_tax_config(&self) -> Result<TaxConfig, SourceError>;

    /// Return a customer's jurisdiction, or `None` if it isn't recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the customer can't be fetched.
    fn customer_jurisdiction(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<Jurisdiction>, SourceError>;

    /// Return an item's display name, or `None` if the item isn't in the catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the item can't be fetched.
    fn item_name(&self, item: &ItemId) -> Result<Option<String>, SourceError>;
}
