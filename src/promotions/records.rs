//! Promotion Records
//!
//! The raw promotion shape as it comes back from storage: loosely typed
//! strings and optional fields that only make sense for some kinds of
//! promotion. Records are converted into [`Promotion`]s before any pricing
//! happens, and a record that doesn't describe exactly one valid promotion
//! is rejected.

use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::DiscountValue,
    ids::{ItemId, PromotionId},
    pricing::{percent_points, round_to_money},
    promotions::{
        DiscountPromotion, DiscountScope, FreeItemPromotion, Promotion, PromotionKind,
        PromotionStatus, PromotionWindow,
    },
};

/// Reasons a stored promotion record can't be turned into a promotion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionRecordError {
    /// A field required by the record's kind is missing
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The promotion kind isn't one the engine knows
    #[error("unknown promotion type: {0}")]
    UnknownKind(String),

    /// The status isn't `active` or `inactive`
    #[error("unknown promotion status: {0}")]
    UnknownStatus(String),

    /// The discount amount type isn't `percentage` or `fixed`
    #[error("unknown amount type: {0}")]
    UnknownAmountKind(String),

    /// A date bound couldn't be parsed
    #[error("invalid {field}: {value}")]
    InvalidDate {
        /// Field name
        field: &'static str,

        /// Raw value
        value: String,
    },

    /// The start date is after the end date
    #[error("start date is after end date")]
    InvertedWindow,

    /// The discount amount is negative, not finite, or too large
    #[error("invalid discount amount")]
    InvalidAmount,

    /// A percentage discount above 100%
    #[error("percentage discount above 100%")]
    PercentageAboveHundred,

    /// A free-item quantity below 1
    #[error("invalid {0}: must be at least 1")]
    InvalidQuantity(&'static str),

    /// A field that belongs to the other kind of promotion is set
    #[error("{0} is not allowed on this type of promotion")]
    ConflictingFields(&'static str),
}

/// A promotion as stored.
///
/// Every field defaults when absent, so a record with missing fields still
/// deserializes and is rejected on its own by [`Promotion::try_from_record`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Promotion id
    #[serde(default)]
    pub id: String,

    /// Promotion title
    #[serde(default)]
    pub title: String,

    /// `active` or `inactive`
    #[serde(default)]
    pub status: String,

    /// First day (or instant) the promotion applies
    #[serde(default)]
    pub start_date: String,

    /// Last day (or instant) the promotion applies
    #[serde(default)]
    pub end_date: String,

    /// `discount` or `free_item`
    #[serde(default, rename = "type")]
    pub promotion_type: String,

    /// Discount: scoped item id; absent for a Global discount
    #[serde(default)]
    pub item_id: Option<String>,

    /// Discount: percentage points or major currency units
    #[serde(default)]
    pub amount: Option<f64>,

    /// Discount: `percentage` or `fixed`
    #[serde(default)]
    pub amount_type: Option<String>,

    /// Free item: trigger item id
    #[serde(default)]
    pub buy_item_id: Option<String>,

    /// Free item: units of the trigger item per grant
    #[serde(default)]
    pub buy_quantity: Option<i64>,

    /// Free item: rewarded item id
    #[serde(default)]
    pub get_item_id: Option<String>,

    /// Free item: rewarded units per grant
    #[serde(default)]
    pub get_quantity: Option<i64>,
}

impl<'a> Promotion<'a> {
    /// Convert a stored record into a promotion.
    ///
    /// Fixed discount amounts are read as major units of `currency`. Bounds
    /// given as civil dates are read in `time_zone`; a civil end date covers
    /// the whole of that day.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionRecordError`] if the record is malformed or
    /// partially populated.
    pub fn try_from_record(
        record: &PromotionRecord,
        currency: &'a Currency,
        time_zone: &TimeZone,
    ) -> Result<Self, PromotionRecordError> {
        let id = required(&record.id, "id")?;
        let status = parse_status(required(&record.status, "status")?)?;
        let window = parse_window(record, time_zone)?;

        let kind = match normalise(required(&record.promotion_type, "type")?).as_str() {
            "discount" => {
                reject_set(&FREE_ITEM_FIELDS, record)?;

                PromotionKind::Discount(parse_discount(record, currency)?)
            }
            "free_item" | "freeitem" | "free" => {
                reject_set(&DISCOUNT_FIELDS, record)?;

                PromotionKind::FreeItem(parse_free_item(record)?)
            }
            _ => {
                return Err(PromotionRecordError::UnknownKind(
                    record.promotion_type.clone(),
                ));
            }
        };

        Ok(Promotion::new(
            PromotionId::new(id),
            record.title.clone(),
            status,
            window,
            kind,
        ))
    }
}

/// A kind-specific field: its name and whether the record sets it.
type FieldCheck = (&'static str, fn(&PromotionRecord) -> bool);

const DISCOUNT_FIELDS: [FieldCheck; 3] = [
    ("item_id", |record| is_set(record.item_id.as_deref())),
    ("amount", |record| record.amount.is_some()),
    ("amount_type", |record| is_set(record.amount_type.as_deref())),
];

const FREE_ITEM_FIELDS: [FieldCheck; 4] = [
    ("buy_item_id", |record| is_set(record.buy_item_id.as_deref())),
    ("buy_quantity", |record| record.buy_quantity.is_some()),
    ("get_item_id", |record| is_set(record.get_item_id.as_deref())),
    ("get_quantity", |record| record.get_quantity.is_some()),
];

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

/// Reject a record that sets any of the other kind's fields.
fn reject_set(fields: &[FieldCheck], record: &PromotionRecord) -> Result<(), PromotionRecordError> {
    match fields.iter().find(|(_, set)| set(record)) {
        Some((field, _)) => Err(PromotionRecordError::ConflictingFields(field)),
        None => Ok(()),
    }
}

fn required<'r>(value: &'r str, field: &'static str) -> Result<&'r str, PromotionRecordError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(PromotionRecordError::MissingField(field));
    }

    Ok(value)
}

fn normalise(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

fn parse_status(raw: &str) -> Result<PromotionStatus, PromotionRecordError> {
    match normalise(raw).as_str() {
        "active" => Ok(PromotionStatus::Active),
        "inactive" => Ok(PromotionStatus::Inactive),
        _ => Err(PromotionRecordError::UnknownStatus(raw.to_string())),
    }
}

fn parse_window(
    record: &PromotionRecord,
    time_zone: &TimeZone,
) -> Result<PromotionWindow, PromotionRecordError> {
    let start = parse_bound("start_date", &record.start_date, time_zone, Bound::Start)?;
    let end = parse_bound("end_date", &record.end_date, time_zone, Bound::End)?;

    PromotionWindow::new(start, end).ok_or(PromotionRecordError::InvertedWindow)
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Parse an RFC 3339 instant, a civil date-time, or a civil date.
fn parse_bound(
    field: &'static str,
    raw: &str,
    time_zone: &TimeZone,
    bound: Bound,
) -> Result<Timestamp, PromotionRecordError> {
    let invalid = || PromotionRecordError::InvalidDate {
        field,
        value: raw.to_string(),
    };

    let value = raw.trim();

    if value.is_empty() {
        return Err(PromotionRecordError::MissingField(field));
    }

    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Ok(timestamp);
    }

    let datetime = if value.contains(['T', 't', ' ']) {
        value.parse::<DateTime>().map_err(|_err| invalid())?
    } else {
        let date = value.parse::<Date>().map_err(|_err| invalid())?;

        match bound {
            Bound::Start => date.at(0, 0, 0, 0),
            Bound::End => date.at(23, 59, 59, 999_999_999),
        }
    };

    datetime
        .to_zoned(time_zone.clone())
        .map(|zoned| zoned.timestamp())
        .map_err(|_err| invalid())
}

fn parse_discount<'a>(
    record: &PromotionRecord,
    currency: &'a Currency,
) -> Result<DiscountPromotion<'a>, PromotionRecordError> {
    let amount = record
        .amount
        .ok_or(PromotionRecordError::MissingField("amount"))?;

    let amount = Decimal::from_f64(amount)
        .filter(|amount| !amount.is_sign_negative())
        .ok_or(PromotionRecordError::InvalidAmount)?;

    let amount_type = record
        .amount_type
        .as_deref()
        .ok_or(PromotionRecordError::MissingField("amount_type"))?;

    let value = match normalise(amount_type).as_str() {
        "percentage" | "percent" => {
            if amount > Decimal::ONE_HUNDRED {
                return Err(PromotionRecordError::PercentageAboveHundred);
            }

            DiscountValue::Percentage(percent_points(amount))
        }
        "fixed" | "amount" => {
            let scale = 10_i64
                .checked_pow(currency.exponent)
                .map(Decimal::from)
                .ok_or(PromotionRecordError::InvalidAmount)?;

            let minor = amount
                .checked_mul(scale)
                .ok_or(PromotionRecordError::InvalidAmount)?;

            DiscountValue::Fixed(
                round_to_money(minor, currency).map_err(|_err| PromotionRecordError::InvalidAmount)?,
            )
        }
        _ => {
            return Err(PromotionRecordError::UnknownAmountKind(
                amount_type.to_string(),
            ));
        }
    };

    let scope = match record.item_id.as_deref().map(str::trim) {
        None | Some("") => DiscountScope::Global,
        Some(item) => DiscountScope::Item(ItemId::new(item)),
    };

    Ok(DiscountPromotion { scope, value })
}

fn parse_free_item(record: &PromotionRecord) -> Result<FreeItemPromotion, PromotionRecordError> {
    let buy_item_id = required_id(record.buy_item_id.as_deref(), "buy_item_id")?;
    let get_item_id = required_id(record.get_item_id.as_deref(), "get_item_id")?;
    let buy_qty = required_quantity(record.buy_quantity, "buy_quantity")?;
    let get_qty = required_quantity(record.get_quantity, "get_quantity")?;

    Ok(FreeItemPromotion {
        buy_item_id,
        buy_qty,
        get_item_id,
        get_qty,
    })
}

fn required_id(raw: Option<&str>, field: &'static str) -> Result<ItemId, PromotionRecordError> {
    match raw.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(ItemId::new(id)),
        _ => Err(PromotionRecordError::MissingField(field)),
    }
}

fn required_quantity(raw: Option<i64>, field: &'static str) -> Result<u32, PromotionRecordError> {
    let quantity = raw.ok_or(PromotionRecordError::MissingField(field))?;

    u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity >= 1)
        .ok_or(PromotionRecordError::InvalidQuantity(field))
}
