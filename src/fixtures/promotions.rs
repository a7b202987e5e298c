//! Promotion Fixtures
//!
//! Promotions are kept as raw records so fixture sets exercise the same
//! record validation as stored data.

use serde::Deserialize;

use crate::promotions::records::PromotionRecord;

/// Wrapper for promotions in YAML, in catalog order
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Promotion records
    pub promotions: Vec<PromotionRecord>,
}
