//! Receipt
//!
//! Plain-text rendering of a priced order for the till and the demo.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    engine::PricedOrder,
    orders::OrderLine,
    pricing::fraction,
    tax::{PricingMode, TaxBreakdown},
    totals::TotalsError,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Savings could not be calculated.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// IO error
    #[error("IO error")]
    IO,
}

impl PricedOrder<'_> {
    /// Write the receipt: one table row per line, then the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();
        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = SmallVec::new();

        push_receipt_header(&mut builder);

        for (idx, (line, tax)) in self.lines().enumerate() {
            append_line_row(&mut builder, &mut color_ops, idx, line, tax);
        }

        write_receipt_table(&mut out, builder, color_ops)?;

        write_receipt_summary(&mut out, self)
    }
}

fn push_receipt_header(builder: &mut Builder) {
    builder.push_record([
        "",
        "Item",
        "Qty",
        "Unit Price",
        "Discount",
        "Line Total",
        "Tax",
        "Promotion",
    ]);
}

fn append_line_row(
    builder: &mut Builder,
    color_ops: &mut SmallVec<[(usize, usize, Color); 32]>,
    idx: usize,
    line: &OrderLine<'_>,
    tax: &TaxBreakdown<'_>,
) {
    // header is row 0
    let row = idx + 1;

    let (unit_price, discount, promotion) = if line.is_free() {
        color_ops.push((row, 3, Color::FG_GREEN));

        (
            "FREE".to_string(),
            String::new(),
            line.source_promotion_id()
                .map(ToString::to_string)
                .unwrap_or_default(),
        )
    } else if line.discount_amount().to_minor_units() > 0 {
        color_ops.push((row, 4, Color::FG_GREEN));

        (
            format!("{}", line.unit_price()),
            format!("-{}", line.discount_amount()),
            line.discount_promotion_id()
                .map(ToString::to_string)
                .unwrap_or_default(),
        )
    } else {
        (format!("{}", line.unit_price()), String::new(), String::new())
    };

    color_ops.push((row, 6, color_dark_grey()));

    builder.push_record([
        format!("#{:<3}", row),
        line.name().to_string(),
        line.quantity().to_string(),
        unit_price,
        discount,
        format!("{}", line.discounted_subtotal()),
        tax_cell(tax),
        promotion,
    ]);
}

/// One component per row, e.g. "CGST ₹45.00".
fn tax_cell(tax: &TaxBreakdown<'_>) -> String {
    tax.components()
        .iter()
        .filter(|(_, amount)| amount.to_minor_units() != 0)
        .map(|(name, amount)| format!("{name} {amount}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_receipt_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 32]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..7), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    priced: &PricedOrder<'_>,
) -> Result<(), ReceiptError> {
    let totals = priced.totals();
    let savings = totals.savings()?;
    let savings_percent_points = display_points(totals.savings_percent()?);

    let inclusive = priced
        .taxes()
        .iter()
        .any(|tax| tax.mode() == PricingMode::Inclusive);

    let tax_label = if inclusive { " Tax (included):" } else { " Tax:" };

    let mut rows: SmallVec<[(&str, String); 8]> = SmallVec::new();

    rows.push((" Subtotal:", format!("{}  ", totals.subtotal())));

    for (label, amount) in [
        (" Order discount:", totals.order_discount()),
        (" Service charge:", totals.charge()),
        (" Tips:", totals.tips()),
    ] {
        if !is_zero(&amount) {
            rows.push((label, format!("{amount}  ")));
        }
    }

    rows.push((tax_label, format!("{}  ", totals.tax_total())));
    rows.push((" \x1b[1mTotal:\x1b[0m", format!("\x1b[1m{}\x1b[0m  ", totals.grand_total())));
    rows.push((" Savings:", format!("({savings_percent_points:.2}%) {savings}  ")));

    let label_width = rows
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or(0);

    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or(0);

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

fn is_zero(amount: &Money<'_, Currency>) -> bool {
    amount.to_minor_units() == 0
}

/// Converts a fractional percentage to percent points for display.
fn display_points(percentage: Percentage) -> Decimal {
    (fraction(percentage) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{engine::PricingEngine, fixtures::Fixture, totals::OrderAdjustments};

    use super::*;

    fn render(order: &str, at: &str) -> TestResult<String> {
        let fixture = Fixture::from_set("salon")?;
        let customer = fixture.order_customer(order)?;
        let order = fixture.order(order)?;
        let now: Timestamp = at.parse()?;

        let engine = PricingEngine::new(fixture);
        let priced = engine.price_order(&order, customer.as_ref(), &OrderAdjustments::none(), now)?;

        let mut out = Vec::new();

        priced.write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn receipt_lists_lines_free_items_and_totals() -> TestResult {
        let receipt = render("priya-visit", "2025-06-15T10:00:00Z")?;

        assert!(receipt.contains("Hair Spa"));
        assert!(receipt.contains("Conditioner 200ml"));
        assert!(receipt.contains("FREE"));
        assert!(receipt.contains("shampoo-conditioner"));
        assert!(receipt.contains("spa-week"));
        assert!(receipt.contains("CGST"));
        assert!(receipt.contains("Total:"));
        assert!(receipt.contains("Savings:"));

        Ok(())
    }

    #[test]
    fn receipt_omits_zero_adjustments() -> TestResult {
        let receipt = render("walk-in", "2025-06-15T10:00:00Z")?;

        assert!(!receipt.contains("Tips:"));
        assert!(!receipt.contains("Order discount:"));

        Ok(())
    }

    #[test]
    fn display_points_converts_fraction() {
        let percentage = Percentage::from(Decimal::new(1234, 4));

        assert_eq!(display_points(percentage), Decimal::new(1234, 2));
    }

    #[test]
    fn visible_width_ignores_ansi_escapes() {
        assert_eq!(visible_width("\x1b[1mTotal:\x1b[0m"), 6);
    }
}
