//! Products

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};

use crate::ids::ItemId;

/// Catalog product: a salon service or a retail item.
#[derive(Debug, Clone, PartialEq)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Product price
    pub price: Money<'a, Currency>,
}

/// Resolves catalog item ids to display names.
///
/// Free lines granted by a promotion reference an item by id only, so the
/// resolver needs a way to name them.
pub trait ItemNames {
    /// Return the display name for an item, if it is known.
    fn item_name(&self, item: &ItemId) -> Option<String>;
}

impl ItemNames for FxHashMap<ItemId, String> {
    fn item_name(&self, item: &ItemId) -> Option<String> {
        self.get(item).cloned()
    }
}

impl ItemNames for FxHashMap<ItemId, Product<'_>> {
    fn item_name(&self, item: &ItemId) -> Option<String> {
        self.get(item).map(|product| product.name.clone())
    }
}

/// Name lookup that knows no items; every free line falls back to its raw id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoItemNames;

impl ItemNames for NoItemNames {
    fn item_name(&self, _item: &ItemId) -> Option<String> {
        None
    }
}
