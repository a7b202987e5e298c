//! Salon pricing prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    discounts::{DiscountError, DiscountValue},
    engine::{PricedOrder, PricingEngine, PricingError},
    ids::{CustomerId, ItemId, PromotionId},
    orders::{Order, OrderError, OrderLine},
    pricing::PriceError,
    products::{ItemNames, NoItemNames, Product},
    promotions::{
        DiscountPromotion, DiscountScope, FreeItemPromotion, Promotion, PromotionKind,
        PromotionStatus, PromotionWindow,
        catalog::{ActivePromotions, PromotionCatalog},
        conflicts::{ConflictKind, PromotionConflict, find_conflicts},
        records::{PromotionRecord, PromotionRecordError},
        resolver::{PromotionResolver, resolve},
    },
    receipt::ReceiptError,
    source::{PricingSource, SourceError},
    tax::{
        Jurisdiction, PricingMode, TaxBreakdown, TaxComponent, TaxConfig, TaxSchedule,
        compute_tax,
    },
    totals::{Adjustment, OrderAdjustments, Totals, TotalsError, aggregate},
};
