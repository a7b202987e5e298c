//! Salon Pricing
//!
//! Order pricing for a salon point of sale: promotion resolution, GST-style
//! tax computation and order totals, driven by a pluggable data source.

pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod ids;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod receipt;
pub mod source;
pub mod tax;
pub mod totals;
pub mod utils;
