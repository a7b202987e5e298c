//! Promotion Resolver
//!
//! Decides, for a whole order, which discount each line gets and which free
//! lines are granted. Precedence is fixed:
//!
//! 1. A Global discount applies to every purchased line, and while one is
//!    active no free-item promotion is considered at all.
//! 2. Otherwise each line takes the first item-specific discount for its item.
//! 3. Otherwise-independent free-item promotions grant
//!    `floor(quantity / buy_qty) * get_qty` free units per trigger line.
//!
//! Ties inside a tier go to the first promotion in catalog order. The
//! resolver always starts from the purchased lines with their discounts
//! cleared and rebuilds free lines from scratch, so resolving an already
//! resolved order gives the same result.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    discounts::{DiscountError, discount_amount},
    ids::{ItemId, PromotionId},
    orders::{Order, OrderLine},
    products::ItemNames,
    promotions::{DiscountPromotion, FreeItemPromotion, Promotion, catalog::ActivePromotions},
};

/// Applies a snapshot of active promotions to orders.
#[derive(Debug)]
pub struct PromotionResolver<'p, 'a, N: ItemNames> {
    promotions: &'p ActivePromotions<'a>,
    names: &'p N,
}

impl<'p, 'a, N: ItemNames> PromotionResolver<'p, 'a, N> {
    /// Create a resolver over `promotions`, naming free lines with `names`.
    pub fn new(promotions: &'p ActivePromotions<'a>, names: &'p N) -> Self {
        Self { promotions, names }
    }

    /// Resolve an order, returning a new order with discounts applied and
    /// free lines granted. The input order is left untouched.
    #[tracing::instrument(
        name = "pricing.resolver.resolve",
        skip_all,
        fields(lines = order.len(), promotions = self.promotions.len())
    )]
    pub fn resolve(&self, order: &Order<'a>) -> Order<'a> {
        let purchased: Vec<OrderLine<'a>> = order
            .purchased_lines()
            .map(|line| {
                line.undiscounted().unwrap_or_else(|error| {
                    warn!(item_id = %line.item_id(), %error, "line subtotal overflowed");
                    line.clone()
                })
            })
            .collect();

        if let Some((promotion, discount)) = self.global_discount() {
            debug!(
                promotion_id = %promotion.id(),
                "global discount selected; item discounts and free items skipped"
            );

            let lines = purchased
                .iter()
                .map(|line| apply_discount(line, promotion, discount))
                .collect();

            return Order::from_resolved_lines(lines, order.currency());
        }

        let mut lines: Vec<OrderLine<'a>> = purchased
            .iter()
            .map(|line| match self.item_discount(line.item_id()) {
                Some((promotion, discount)) => apply_discount(line, promotion, discount),
                None => line.clone(),
            })
            .collect();

        lines.extend(self.free_lines(&purchased, order));

        Order::from_resolved_lines(lines, order.currency())
    }

    /// Return the first active Global discount in catalog order.
    fn global_discount(&self) -> Option<(&'p Promotion<'a>, &'p DiscountPromotion<'a>)> {
        let mut globals = self.promotions.iter().filter_map(|promotion| {
            promotion
                .as_global_discount()
                .map(|discount| (promotion, discount))
        });

        let selected = globals.next()?;
        let ignored = globals.count();

        if ignored > 0 {
            warn!(
                promotion_id = %selected.0.id(),
                ignored,
                "multiple global discounts active; using the first in catalog order"
            );
        }

        Some(selected)
    }

    /// Return the first active discount scoped to `item` in catalog order.
    fn item_discount(
        &self,
        item: &ItemId,
    ) -> Option<(&'p Promotion<'a>, &'p DiscountPromotion<'a>)> {
        self.promotions.iter().find_map(|promotion| {
            promotion
                .as_item_discount(item)
                .map(|discount| (promotion, discount))
        })
    }

    /// Build the free lines earned by `purchased`.
    ///
    /// Lines are keyed by (promotion, rewarded item): a second trigger line
    /// for the same promotion adds to the existing free line.
    fn free_lines(&self, purchased: &[OrderLine<'a>], order: &Order<'a>) -> Vec<OrderLine<'a>> {
        let mut granted: Vec<OrderLine<'a>> = Vec::new();
        let mut index: FxHashMap<(&PromotionId, &ItemId), usize> = FxHashMap::default();

        let rules = self.promotions.iter().filter_map(|promotion| {
            promotion
                .as_free_item()
                .map(|free_item| (promotion, free_item))
        });

        for (promotion, rule) in rules {
            for line in purchased
                .iter()
                .filter(|line| line.item_id() == &rule.buy_item_id)
            {
                let count = rule.free_count(line.quantity());

                if count == 0 {
                    continue;
                }

                debug!(
                    promotion_id = %promotion.id(),
                    get_item_id = %rule.get_item_id,
                    count,
                    "granting free items"
                );

                let key = (promotion.id(), &rule.get_item_id);

                match index.get(&key).and_then(|&idx| granted.get_mut(idx)) {
                    Some(existing) => {
                        let quantity = existing.quantity().saturating_add(count);

                        match existing.with_quantity(quantity) {
                            Ok(updated) => *existing = updated,
                            Err(error) => {
                                warn!(promotion_id = %promotion.id(), %error, "free line overflowed");
                            }
                        }
                    }
                    None => {
                        index.insert(key, granted.len());
                        granted.push(self.free_line(promotion, rule, count, order));
                    }
                }
            }
        }

        granted
    }

    fn free_line(
        &self,
        promotion: &Promotion<'a>,
        rule: &FreeItemPromotion,
        count: u32,
        order: &Order<'a>,
    ) -> OrderLine<'a> {
        let name = self.names.item_name(&rule.get_item_id).unwrap_or_else(|| {
            warn!(
                promotion_id = %promotion.id(),
                get_item_id = %rule.get_item_id,
                "free item not in catalog; using its id as the name"
            );

            rule.get_item_id.to_string()
        });

        OrderLine::free(
            rule.get_item_id.clone(),
            name,
            count,
            order.currency(),
            rule.buy_item_id.clone(),
            promotion.id().clone(),
        )
    }
}

/// Apply a discount promotion to one line, leaving the line undiscounted if
/// the discount can't be calculated.
fn apply_discount<'a>(
    line: &OrderLine<'a>,
    promotion: &Promotion<'a>,
    discount: &DiscountPromotion<'a>,
) -> OrderLine<'a> {
    let discounted = discount_amount(&discount.value, line.unit_price(), line.quantity())
        .and_then(|amount| {
            line.with_discount(amount, promotion.id().clone())
                .map_err(DiscountError::from)
        });

    match discounted {
        Ok(discounted) => discounted,
        Err(error) => {
            warn!(
                promotion_id = %promotion.id(),
                item_id = %line.item_id(),
                %error,
                "discount could not be applied"
            );

            line.clone()
        }
    }
}

/// Resolve `order` against `promotions`; see [`PromotionResolver::resolve`].
pub fn resolve<'a>(
    order: &Order<'a>,
    promotions: &ActivePromotions<'a>,
    names: &impl ItemNames,
) -> Order<'a> {
    PromotionResolver::new(promotions, names).resolve(order)
}
