//! Promotion Conflicts
//!
//! Checks run when a promotion is created or edited. Pricing never relies on
//! them: stored data may still contain conflicting promotions, and the
//! resolver settles those by precedence and catalog order.

use crate::{
    ids::{ItemId, PromotionId},
    promotions::{DiscountScope, Promotion, PromotionKind, PromotionStatus},
};

/// Why two promotions can't run in overlapping windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Both promotions are Global discounts
    DuplicateGlobal,

    /// One promotion is a Global discount, which excludes every other promotion
    GlobalExcludesOthers,

    /// Both promotions have the same kind and target the same item
    DuplicateTarget,
}

/// A stored promotion that conflicts with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionConflict {
    /// The conflicting stored promotion
    pub promotion_id: PromotionId,

    /// Why it conflicts
    pub kind: ConflictKind,
}

/// What a promotion targets, for conflict purposes.
#[derive(PartialEq, Eq)]
enum Target<'p> {
    GlobalDiscount,
    ItemDiscount(&'p ItemId),
    FreeItem(&'p ItemId),
}

fn target<'p>(promotion: &'p Promotion<'_>) -> Target<'p> {
    match promotion.kind() {
        PromotionKind::Discount(discount) => match &discount.scope {
            DiscountScope::Global => Target::GlobalDiscount,
            DiscountScope::Item(item) => Target::ItemDiscount(item),
        },
        PromotionKind::FreeItem(free_item) => Target::FreeItem(&free_item.buy_item_id),
    }
}

/// Return the reason two promotions conflict, if they do.
///
/// Promotions conflict only when both are active and their windows overlap.
pub fn conflict_between(a: &Promotion<'_>, b: &Promotion<'_>) -> Option<ConflictKind> {
    if a.id() == b.id()
        || a.status() != PromotionStatus::Active
        || b.status() != PromotionStatus::Active
        || !a.window().overlaps(b.window())
    {
        return None;
    }

    match (target(a), target(b)) {
        (Target::GlobalDiscount, Target::GlobalDiscount) => Some(ConflictKind::DuplicateGlobal),
        (Target::GlobalDiscount, _) | (_, Target::GlobalDiscount) => {
            Some(ConflictKind::GlobalExcludesOthers)
        }
        (left, right) if left == right => Some(ConflictKind::DuplicateTarget),
        _ => None,
    }
}

/// Return every stored promotion that conflicts with `candidate`, in catalog order.
pub fn find_conflicts<'p, 'a: 'p>(
    candidate: &Promotion<'_>,
    existing: impl IntoIterator<Item = &'p Promotion<'a>>,
) -> Vec<PromotionConflict> {
    existing
        .into_iter()
        .filter_map(|other| {
            conflict_between(candidate, other).map(|kind| PromotionConflict {
                promotion_id: other.id().clone(),
                kind,
            })
        })
        .collect()
}
