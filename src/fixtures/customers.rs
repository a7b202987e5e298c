//! Customer Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::tax::Jurisdiction;

/// Wrapper for customers in YAML
#[derive(Debug, Deserialize)]
pub struct CustomersFixture {
    /// Map of customer id -> customer fixture
    pub customers: FxHashMap<String, CustomerFixture>,
}

/// Customer Fixture
#[derive(Debug, Deserialize)]
pub struct CustomerFixture {
    /// Customer name
    pub name: String,

    /// Whether the customer is in the salon's state; unrecorded when absent
    #[serde(default)]
    pub same_state: Option<bool>,
}

impl CustomerFixture {
    /// Return the customer's jurisdiction, if recorded
    pub fn jurisdiction(&self) -> Option<Jurisdiction> {
        self.same_state
            .map(|same_state| Jurisdiction { same_state })
    }
}
