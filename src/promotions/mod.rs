//! Promotions

use jiff::Timestamp;

use crate::{
    discounts::DiscountValue,
    ids::{ItemId, PromotionId},
};

pub mod catalog;
pub mod conflicts;
pub mod records;
pub mod resolver;

/// Promotion status as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionStatus {
    /// Promotion may apply while inside its window
    Active,

    /// Promotion never applies
    Inactive,
}

/// Inclusive validity window of a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionWindow {
    start: Timestamp,
    end: Timestamp,
}

impl PromotionWindow {
    /// Create a window; returns `None` if `start` is after `end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Return the first instant of the window
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Return the last instant of the window
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Return whether `now` falls inside the window (both ends inclusive).
    pub fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.end
    }

    /// Return whether two windows share at least one instant.
    pub fn overlaps(&self, other: &PromotionWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Which lines a discount promotion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountScope {
    /// Every purchased line in the order
    Global,

    /// Only lines for this catalog item
    Item(ItemId),
}

/// A discount promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountPromotion<'a> {
    /// Lines the discount applies to
    pub scope: DiscountScope,

    /// Discount value
    pub value: DiscountValue<'a>,
}

/// A "buy N get M free" promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeItemPromotion {
    /// Trigger item
    pub buy_item_id: ItemId,

    /// Units of the trigger item needed per grant (at least 1)
    pub buy_qty: u32,

    /// Rewarded item
    pub get_item_id: ItemId,

    /// Units of the rewarded item per grant (at least 1)
    pub get_qty: u32,
}

impl FreeItemPromotion {
    /// Return how many free units `quantity` units of the trigger item earn.
    ///
    /// `floor(quantity / buy_qty) * get_qty`, saturating at `u32::MAX`.
    pub fn free_count(&self, quantity: u32) -> u32 {
        quantity
            .checked_div(self.buy_qty)
            .unwrap_or(0)
            .saturating_mul(self.get_qty)
    }
}

/// What a promotion does.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionKind<'a> {
    /// Money off one or all lines
    Discount(DiscountPromotion<'a>),

    /// Free units of an item for buying another
    FreeItem(FreeItemPromotion),
}

/// A fully validated promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion<'a> {
    id: PromotionId,
    title: String,
    status: PromotionStatus,
    window: PromotionWindow,
    kind: PromotionKind<'a>,
}

impl<'a> Promotion<'a> {
    /// Create a new promotion.
    pub fn new(
        id: impl Into<PromotionId>,
        title: impl Into<String>,
        status: PromotionStatus,
        window: PromotionWindow,
        kind: PromotionKind<'a>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status,
            window,
            kind,
        }
    }

    /// Return the promotion id
    pub fn id(&self) -> &PromotionId {
        &self.id
    }

    /// Return the promotion title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Return the stored status
    pub fn status(&self) -> PromotionStatus {
        self.status
    }

    /// Return the validity window
    pub fn window(&self) -> &PromotionWindow {
        &self.window
    }

    /// Return what the promotion does
    pub fn kind(&self) -> &PromotionKind<'a> {
        &self.kind
    }

    /// Return whether the promotion is active at `now`: status is
    /// [`PromotionStatus::Active`] and `now` is inside the window.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == PromotionStatus::Active && self.window.contains(now)
    }

    /// Return the discount if this is a discount promotion with no item scope.
    pub fn as_global_discount(&self) -> Option<&DiscountPromotion<'a>> {
        match &self.kind {
            PromotionKind::Discount(discount) if discount.scope == DiscountScope::Global => {
                Some(discount)
            }
            _ => None,
        }
    }

    /// Return the discount if this is a discount promotion scoped to `item`.
    pub fn as_item_discount(&self, item: &ItemId) -> Option<&DiscountPromotion<'a>> {
        match &self.kind {
            PromotionKind::Discount(discount)
                if matches!(&discount.scope, DiscountScope::Item(id) if id == item) =>
            {
                Some(discount)
            }
            _ => None,
        }
    }

    /// Return the free-item rule if this is a free-item promotion.
    pub fn as_free_item(&self) -> Option<&FreeItemPromotion> {
        match &self.kind {
            PromotionKind::FreeItem(free_item) => Some(free_item),
            PromotionKind::Discount(_) => None,
        }
    }
}
