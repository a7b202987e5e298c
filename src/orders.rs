//! Orders

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    ids::{ItemId, PromotionId},
    pricing::{PriceError, line_subtotal_minor, round_to_money},
};

/// Errors related to order construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// A line's currency differs from the order currency (index, line currency, order currency).
    #[error("Line {0} has currency {1}, but order has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line was added with a zero quantity (index).
    #[error("Line {0} has a zero quantity")]
    ZeroQuantity(usize),

    /// A line subtotal does not fit the minor-unit range (index).
    #[error("Line {0} subtotal overflowed")]
    Overflow(usize),
}

/// One entry in an order: a purchased item, or a free item granted by a promotion.
///
/// The discount fields and the free-line fields are derived. They are
/// recomputed from scratch on every resolver pass and never accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine<'a> {
    item_id: ItemId,
    name: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    is_free: bool,
    discount_amount: Money<'a, Currency>,
    discounted_subtotal: Money<'a, Currency>,
    discount_promotion_id: Option<PromotionId>,
    source_item_id: Option<ItemId>,
    source_promotion_id: Option<PromotionId>,
}

impl<'a> OrderLine<'a> {
    /// Create a purchased line with no discount applied.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if `unit_price * quantity` does not fit.
    pub fn new(
        item_id: impl Into<ItemId>,
        name: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Result<Self, PriceError> {
        let subtotal = round_to_money(
            line_subtotal_minor(&unit_price, quantity)?,
            unit_price.currency(),
        )?;

        Ok(Self {
            item_id: item_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            is_free: false,
            discount_amount: Money::from_minor(0, unit_price.currency()),
            discounted_subtotal: subtotal,
            discount_promotion_id: None,
            source_item_id: None,
            source_promotion_id: None,
        })
    }

    /// Create a free line granted by `promotion` for buying `source_item`.
    pub fn free(
        item_id: ItemId,
        name: impl Into<String>,
        quantity: u32,
        currency: &'a Currency,
        source_item: ItemId,
        promotion: PromotionId,
    ) -> Self {
        let zero = Money::from_minor(0, currency);

        Self {
            item_id,
            name: name.into(),
            unit_price: zero,
            quantity,
            is_free: true,
            discount_amount: zero,
            discounted_subtotal: zero,
            discount_promotion_id: None,
            source_item_id: Some(source_item),
            source_promotion_id: Some(promotion),
        }
    }

    /// Return a copy of this line with the discount fields cleared.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the line subtotal does not fit.
    pub fn undiscounted(&self) -> Result<Self, PriceError> {
        Ok(Self {
            discount_amount: Money::from_minor(0, self.currency()),
            discounted_subtotal: self.subtotal()?,
            discount_promotion_id: None,
            ..self.clone()
        })
    }

    /// Return a copy of this line discounted by `amount` under `promotion`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the line subtotal does not fit.
    pub fn with_discount(
        &self,
        amount: Money<'a, Currency>,
        promotion: PromotionId,
    ) -> Result<Self, PriceError> {
        let subtotal = self.subtotal()?;
        let discounted = subtotal
            .to_minor_units()
            .checked_sub(amount.to_minor_units())
            .ok_or(PriceError::Overflow)?;

        Ok(Self {
            discount_amount: amount,
            discounted_subtotal: Money::from_minor(discounted, self.currency()),
            discount_promotion_id: Some(promotion),
            ..self.clone()
        })
    }

    /// Return a copy of this line with a different quantity and no discount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the new line subtotal does not fit.
    pub fn with_quantity(&self, quantity: u32) -> Result<Self, PriceError> {
        Self {
            quantity,
            ..self.clone()
        }
        .undiscounted()
    }

    /// Return the catalog item id
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Return the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the unit price
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Return the quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Return whether the line was granted free by a promotion
    pub fn is_free(&self) -> bool {
        self.is_free
    }

    /// Return the discount taken off the line
    pub fn discount_amount(&self) -> &Money<'a, Currency> {
        &self.discount_amount
    }

    /// Return the line subtotal after the line discount
    pub fn discounted_subtotal(&self) -> &Money<'a, Currency> {
        &self.discounted_subtotal
    }

    /// Return the promotion that produced the line discount, if any
    pub fn discount_promotion_id(&self) -> Option<&PromotionId> {
        self.discount_promotion_id.as_ref()
    }

    /// Return the purchased item that earned this free line
    pub fn source_item_id(&self) -> Option<&ItemId> {
        self.source_item_id.as_ref()
    }

    /// Return the promotion that granted this free line
    pub fn source_promotion_id(&self) -> Option<&PromotionId> {
        self.source_promotion_id.as_ref()
    }

    /// Return the line currency
    pub fn currency(&self) -> &'a Currency {
        self.unit_price.currency()
    }

    /// Return `unit_price * quantity`, before any discount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product does not fit.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PriceError> {
        round_to_money(
            line_subtotal_minor(&self.unit_price, self.quantity)?,
            self.currency(),
        )
    }
}

/// Order (cart) with lines in a single currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<'a> {
    lines: Vec<OrderLine<'a>>,
    currency: &'a Currency,
}

impl<'a> Order<'a> {
    /// Create a new empty order.
    pub fn new(currency: &'a Currency) -> Self {
        Order {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a new order with the given lines.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if a line has a zero quantity, or is priced
    /// in a different currency to the order.
    pub fn with_lines(
        lines: impl Into<Vec<OrderLine<'a>>>,
        currency: &'a Currency,
    ) -> Result<Self, OrderError> {
        let lines = lines.into();

        lines.iter().enumerate().try_for_each(|(i, line)| {
            let line_currency = line.currency();

            if line_currency != currency {
                return Err(OrderError::CurrencyMismatch(
                    i,
                    line_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if line.quantity() == 0 {
                return Err(OrderError::ZeroQuantity(i));
            }

            Ok(())
        })?;

        Ok(Order { lines, currency })
    }

    /// Add a line to the order.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] under the same rules as [`Order::with_lines`].
    pub fn push(&mut self, line: OrderLine<'a>) -> Result<(), OrderError> {
        let idx = self.lines.len();

        if line.currency() != self.currency {
            return Err(OrderError::CurrencyMismatch(
                idx,
                line.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if line.quantity() == 0 {
            return Err(OrderError::ZeroQuantity(idx));
        }

        self.lines.push(line);

        Ok(())
    }

    /// Get the order lines.
    pub fn lines(&self) -> &[OrderLine<'a>] {
        &self.lines
    }

    /// Iterate over the order lines.
    pub fn iter(&self) -> impl Iterator<Item = &OrderLine<'a>> {
        self.lines.iter()
    }

    /// Iterate over the purchased (non-free) lines.
    pub fn purchased_lines(&self) -> impl Iterator<Item = &OrderLine<'a>> {
        self.lines.iter().filter(|line| !line.is_free())
    }

    /// Iterate over the free lines granted by promotions.
    pub fn free_lines(&self) -> impl Iterator<Item = &OrderLine<'a>> {
        self.lines.iter().filter(|line| line.is_free())
    }

    /// Return a copy of the order without free lines and with all line
    /// discounts cleared.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Overflow`] if a line subtotal does not fit.
    pub fn without_promotions(&self) -> Result<Self, OrderError> {
        let lines = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_free())
            .map(|(i, line)| {
                line.undiscounted()
                    .map_err(|_err| OrderError::Overflow(i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            lines,
            currency: self.currency,
        })
    }

    /// Get the number of lines in the order.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the order is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the order.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    pub(crate) fn from_resolved_lines(lines: Vec<OrderLine<'a>>, currency: &'a Currency) -> Self {
        Order { lines, currency }
    }
}
