//! Price Order Example
//!
//! Prices a named order from a fixture set and prints the receipt. Promotions
//! are resolved at the given instant, so the same order can be priced inside
//! and outside a sale:
//!
//! Run with: `cargo run --example price_order -- --order priya-visit --at 2025-10-20T10:00:00Z`

use std::{io, time::Instant};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use salon_pricing::{
    engine::PricingEngine, fixtures::Fixture, ids::CustomerId, utils::PriceOrderArgs,
};

/// Price Order Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = PriceOrderArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let order = fixture.order(&args.order)?;

    let customer = match &args.customer {
        Some(customer) => Some(CustomerId::new(customer.as_str())),
        None => fixture.order_customer(&args.order)?,
    };

    let adjustments = args.adjustments()?;
    let now = args.now()?;

    let engine = PricingEngine::new(fixture).with_time_zone(args.time_zone()?);

    let start = Instant::now();

    let priced = engine.price_order(&order, customer.as_ref(), &adjustments, now)?;

    let elapsed = start.elapsed().as_secs_f32();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    priced.write_to(&mut handle)?;

    println!("Priced at {now} in {elapsed}s");

    Ok(())
}
