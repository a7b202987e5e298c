//! Integration tests for pricing orders end to end.
//!
//! The first half prices hand-built orders against hand-built promotion
//! records and tax schedules. The second half prices the named orders of the
//! `salon` fixture set:
//!
//! | Order         | Customer             | Promotions at 2025-06-15                 |
//! |---------------|----------------------|------------------------------------------|
//! | `walk-in`     | none                 | 1 free conditioner (2 shampoos)          |
//! | `priya-visit` | intra-state          | 20% off spa, ₹100 off beard trims, 2 free|
//! | `arjun-visit` | inter-state (IGST)   | none; gift card carries no tax           |
//! | `meera-visit` | no state recorded    | manicure promotion is inactive           |
//!
//! Between 2025-10-15 and 2025-10-25 the Diwali sale (15% off everything)
//! replaces every other promotion.

use jiff::{Timestamp, tz::TimeZone};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::INR};
use testresult::TestResult;

use salon_pricing::{
    engine::{PricedOrder, PricingEngine},
    fixtures::Fixture,
    ids::ItemId,
    orders::{Order, OrderLine},
    pricing::percent_points,
    promotions::{catalog::PromotionCatalog, records::PromotionRecord, resolver::resolve},
    tax::{Jurisdiction, PricingMode, TaxComponent, TaxConfig, TaxSchedule, compute_tax},
    totals::{Adjustment, OrderAdjustments},
    utils::parse_adjustment,
};

fn at(instant: &str) -> TestResult<Timestamp> {
    Ok(instant.parse()?)
}

fn discount_record(id: &str, item: Option<&str>, amount: f64, amount_type: &str) -> PromotionRecord {
    PromotionRecord {
        id: id.to_string(),
        title: id.to_string(),
        status: "active".to_string(),
        start_date: "2025-01-01".to_string(),
        end_date: "2025-12-31".to_string(),
        promotion_type: "discount".to_string(),
        item_id: item.map(ToString::to_string),
        amount: Some(amount),
        amount_type: Some(amount_type.to_string()),
        ..PromotionRecord::default()
    }
}

fn free_item_record(id: &str, buy: &str, buy_qty: i64, get: &str, get_qty: i64) -> PromotionRecord {
    PromotionRecord {
        id: id.to_string(),
        title: id.to_string(),
        status: "active".to_string(),
        start_date: "2025-01-01".to_string(),
        end_date: "2025-12-31".to_string(),
        promotion_type: "free_item".to_string(),
        buy_item_id: Some(buy.to_string()),
        buy_quantity: Some(buy_qty),
        get_item_id: Some(get.to_string()),
        get_quantity: Some(get_qty),
        ..PromotionRecord::default()
    }
}

fn gst_schedule() -> TaxSchedule {
    TaxSchedule::new([
        TaxComponent::new("CGST", percent_points(Decimal::from(9))),
        TaxComponent::new("SGST", percent_points(Decimal::from(9))),
        TaxComponent::new("IGST", percent_points(Decimal::from(18))),
    ])
}

fn resolve_records(order: &Order<'static>, records: &[PromotionRecord]) -> TestResult<Order<'static>> {
    let catalog = PromotionCatalog::from_records(records, INR, &TimeZone::UTC);
    let active = catalog.active(at("2025-06-15T10:00:00Z")?);

    let mut names: FxHashMap<ItemId, String> = FxHashMap::default();
    names.insert(ItemId::new("conditioner"), "Conditioner 200ml".to_string());

    Ok(resolve(order, &active, &names))
}

fn price_fixture_order(
    name: &str,
    instant: &str,
    adjustments: &OrderAdjustments<'static>,
) -> TestResult<PricedOrder<'static>> {
    let fixture = Fixture::from_set("salon")?;
    let order = fixture.order(name)?;
    let customer = fixture.order_customer(name)?;

    let engine = PricingEngine::new(fixture);

    Ok(engine.price_order(&order, customer.as_ref(), adjustments, at(instant)?)?)
}

fn minor_units(priced: &PricedOrder<'_>) -> Vec<i64> {
    priced
        .lines()
        .map(|(line, _)| line.discounted_subtotal().to_minor_units())
        .collect()
}

fn tax_units(priced: &PricedOrder<'_>) -> Vec<i64> {
    priced
        .taxes()
        .iter()
        .map(|tax| tax.total().to_minor_units())
        .collect()
}

#[test]
fn global_percentage_discount_takes_ten_percent_off_line() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("cut", "Cut", Money::from_minor(10_000, INR), 2)?],
        INR,
    )?;

    let resolved = resolve_records(&order, &[discount_record("ten-off", None, 10.0, "percentage")])?;
    let line = resolved.lines().first().ok_or("missing line")?;

    assert_eq!(line.discount_amount().to_minor_units(), 2_000);
    assert_eq!(line.discounted_subtotal().to_minor_units(), 18_000);
    assert_eq!(line.discount_promotion_id().map(|id| id.as_str()), Some("ten-off"));

    Ok(())
}

#[test]
fn fixed_discount_is_capped_per_unit() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("comb", "Comb", Money::from_minor(1_000, INR), 3)?],
        INR,
    )?;

    let resolved = resolve_records(&order, &[discount_record("fifteen-off", Some("comb"), 15.0, "fixed")])?;
    let line = resolved.lines().first().ok_or("missing line")?;

    assert_eq!(line.discount_amount().to_minor_units(), 3_000);
    assert_eq!(line.discounted_subtotal().to_minor_units(), 0);

    Ok(())
}

#[test]
fn buy_two_get_one_grants_floor_of_quantity() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("shampoo", "Shampoo", Money::from_minor(35_000, INR), 5)?],
        INR,
    )?;

    let resolved = resolve_records(&order, &[free_item_record("b2g1", "shampoo", 2, "conditioner", 1)])?;
    let free: Vec<_> = resolved.free_lines().collect();

    assert_eq!(free.len(), 1);

    let free_line = free.first().ok_or("missing free line")?;

    assert_eq!(free_line.quantity(), 2);
    assert_eq!(free_line.name(), "Conditioner 200ml");
    assert_eq!(free_line.source_item_id().map(|id| id.as_str()), Some("shampoo"));
    assert_eq!(free_line.discounted_subtotal().to_minor_units(), 0);

    Ok(())
}

#[test]
fn global_discount_suppresses_free_items() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("shampoo", "Shampoo", Money::from_minor(35_000, INR), 4)?],
        INR,
    )?;

    let resolved = resolve_records(
        &order,
        &[
            free_item_record("b2g1", "shampoo", 2, "conditioner", 1),
            discount_record("sale", None, 10.0, "percentage"),
        ],
    )?;

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.free_lines().count(), 0);

    Ok(())
}

#[test]
fn exclusive_gst_splits_evenly_within_state() -> TestResult {
    let line = OrderLine::new("cut", "Cut", Money::from_minor(10_000, INR), 1)?;
    let config = TaxConfig {
        collect_tax: true,
        pricing_mode: PricingMode::Exclusive,
        is_gst: true,
    };

    let tax = compute_tax(&line, &gst_schedule(), &config, Jurisdiction { same_state: true })?;

    assert_eq!(tax.total().to_minor_units(), 1_800);
    assert_eq!(tax.component("CGST").map(Money::to_minor_units), Some(900));
    assert_eq!(tax.component("SGST").map(Money::to_minor_units), Some(900));
    assert_eq!(tax.component("IGST"), None);

    Ok(())
}

#[test]
fn inclusive_gst_is_extracted_from_price() -> TestResult {
    let line = OrderLine::new("cut", "Cut", Money::from_minor(10_000, INR), 1)?;
    let config = TaxConfig {
        collect_tax: true,
        pricing_mode: PricingMode::Inclusive,
        is_gst: true,
    };

    let tax = compute_tax(&line, &gst_schedule(), &config, Jurisdiction { same_state: true })?;

    // 100 - 100 / 1.18 = 15.2542, split 50/50 and rounded per component
    assert_eq!(tax.component("CGST").map(Money::to_minor_units), Some(763));
    assert_eq!(tax.component("SGST").map(Money::to_minor_units), Some(763));
    assert_eq!(tax.total().to_minor_units(), 1_526);
    assert_eq!(tax.net().to_minor_units() + tax.total().to_minor_units(), 10_000);

    Ok(())
}

#[test]
fn walk_in_earns_free_conditioner() -> TestResult {
    let priced = price_fixture_order("walk-in", "2025-06-15T10:00:00Z", &OrderAdjustments::none())?;

    assert_eq!(minor_units(&priced), vec![50_000, 70_000, 0]);
    assert_eq!(tax_units(&priced), vec![9_000, 12_600, 0]);

    let free_line = priced.order().free_lines().next().ok_or("missing free line")?;

    assert_eq!(free_line.name(), "Conditioner 200ml");
    assert_eq!(free_line.quantity(), 1);
    assert_eq!(
        free_line.source_promotion_id().map(|id| id.as_str()),
        Some("shampoo-conditioner")
    );

    let totals = priced.totals();

    assert_eq!(totals.subtotal().to_minor_units(), 120_000);
    assert_eq!(totals.tax_total().to_minor_units(), 21_600);
    assert_eq!(totals.grand_total().to_minor_units(), 141_600);

    Ok(())
}

#[test]
fn diwali_sale_replaces_every_other_promotion() -> TestResult {
    let priced = price_fixture_order("priya-visit", "2025-10-20T10:00:00Z", &OrderAdjustments::none())?;

    // hair spa, shampoo x5, beard trim x2, each 15% off and nothing free
    assert_eq!(minor_units(&priced), vec![102_000, 148_750, 42_500]);
    assert!(
        priced
            .lines()
            .all(|(line, _)| line.discount_promotion_id().map(|id| id.as_str()) == Some("diwali-sale"))
    );

    let totals = priced.totals();

    assert_eq!(totals.line_discount_total().to_minor_units(), 51_750);
    assert_eq!(totals.subtotal().to_minor_units(), 293_250);
    // tax is charged on the pre-discount price
    assert_eq!(totals.tax_total().to_minor_units(), 62_100);
    assert_eq!(totals.grand_total().to_minor_units(), 355_350);

    Ok(())
}

#[test]
fn priya_visit_combines_item_discounts_and_free_items() -> TestResult {
    let priced = price_fixture_order("priya-visit", "2025-06-15T10:00:00Z", &OrderAdjustments::none())?;

    assert_eq!(minor_units(&priced), vec![96_000, 175_000, 30_000, 0]);
    assert_eq!(tax_units(&priced), vec![21_600, 31_500, 9_000, 0]);

    let free_line = priced.order().free_lines().next().ok_or("missing free line")?;

    assert_eq!(free_line.quantity(), 2);

    let totals = priced.totals();

    assert_eq!(totals.line_discount_total().to_minor_units(), 44_000);
    assert_eq!(totals.subtotal().to_minor_units(), 301_000);
    assert_eq!(totals.grand_total().to_minor_units(), 363_100);
    assert_eq!(totals.savings()?.to_minor_units(), 44_000);

    Ok(())
}

#[test]
fn arjun_visit_is_taxed_inter_state() -> TestResult {
    let priced = price_fixture_order("arjun-visit", "2025-06-15T10:00:00Z", &OrderAdjustments::none())?;

    assert_eq!(tax_units(&priced), vec![9_000, 10_800, 0]);

    for (line, tax) in priced.lines() {
        assert_eq!(tax.component("CGST"), None, "{} taxed as intra-state", line.name());
    }

    let haircut_tax = priced.taxes().first().ok_or("missing tax")?;

    assert_eq!(haircut_tax.component("IGST").map(Money::to_minor_units), Some(9_000));

    let totals = priced.totals();

    assert_eq!(totals.subtotal().to_minor_units(), 210_000);
    assert_eq!(totals.grand_total().to_minor_units(), 229_800);

    Ok(())
}

#[test]
fn customer_without_recorded_state_is_taxed_intra_state() -> TestResult {
    let priced = price_fixture_order("meera-visit", "2025-06-15T10:00:00Z", &OrderAdjustments::none())?;
    let tax = priced.taxes().first().ok_or("missing tax")?;

    // the manicure promotion is inactive
    assert_eq!(minor_units(&priced), vec![120_000]);
    assert_eq!(tax.component("CGST").map(Money::to_minor_units), Some(10_800));
    assert_eq!(tax.component("SGST").map(Money::to_minor_units), Some(10_800));
    assert_eq!(priced.totals().grand_total().to_minor_units(), 141_600);

    Ok(())
}

#[test]
fn order_adjustments_apply_after_line_pricing() -> TestResult {
    let adjustments = OrderAdjustments {
        discount: Some(parse_adjustment("10%")?),
        charge: None,
        tips: Some(Adjustment::Amount(Money::from_minor(10_000, INR))),
    };

    let priced = price_fixture_order("walk-in", "2025-06-15T10:00:00Z", &adjustments)?;
    let totals = priced.totals();

    assert_eq!(totals.order_discount().to_minor_units(), 12_000);
    assert_eq!(totals.tips().to_minor_units(), 10_000);
    // 120000 - 12000 + 21600 + 10000
    assert_eq!(totals.grand_total().to_minor_units(), 139_600);

    Ok(())
}

#[test]
fn receipt_renders_priced_fixture_order() -> TestResult {
    let priced = price_fixture_order("walk-in", "2025-06-15T10:00:00Z", &OrderAdjustments::none())?;
    let mut out = Vec::new();

    priced.write_to(&mut out)?;

    let receipt = String::from_utf8(out)?;

    assert!(receipt.contains("Haircut"));
    assert!(receipt.contains("FREE"));

    Ok(())
}
