//! Order Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Wrapper for orders in YAML
#[derive(Debug, Deserialize)]
pub struct OrdersFixture {
    /// Map of order name -> order fixture
    pub orders: FxHashMap<String, OrderFixture>,
}

/// Order Fixture
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Customer id; absent for walk-ins
    #[serde(default)]
    pub customer: Option<String>,

    /// Order lines, in cart order
    pub lines: Vec<OrderLineFixture>,
}

/// Order line fixture
#[derive(Debug, Deserialize)]
pub struct OrderLineFixture {
    /// Item id, referencing the products fixture
    pub item: String,

    /// Quantity
    pub quantity: u32,

    /// Price override (e.g., "400.00 INR"); the catalog price when absent
    #[serde(default)]
    pub price: Option<String>,
}
