//! Fixtures
//!
//! YAML fixture sets for demos and tests. A set named `salon` is read from
//! `./fixtures/{products,tax,promotions,customers,orders}/salon.yml` and
//! serves as an in-memory [`PricingSource`].

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    fixtures::{
        customers::CustomersFixture, orders::OrdersFixture, products::ProductsFixture,
        promotions::PromotionsFixture, tax::TaxFixture,
    },
    ids::{CustomerId, ItemId},
    orders::{Order, OrderError, OrderLine},
    pricing::PriceError,
    products::Product,
    promotions::records::PromotionRecord,
    source::{PricingSource, SourceError},
    tax::{Jurisdiction, TaxConfig, TaxSchedule},
};

pub mod customers;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod tax;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Line price overflowed
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Order creation error
    #[error("Failed to create order: {0}")]
    Order(#[from] OrderError),
}

/// A loaded fixture set.
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Catalog products by item id
    products: FxHashMap<ItemId, Product<'static>>,

    /// Tax schedules by item id
    schedules: FxHashMap<ItemId, TaxSchedule>,

    /// Company tax configuration
    tax_config: Option<TaxConfig>,

    /// Promotion records in catalog order
    promotions: Vec<PromotionRecord>,

    /// Recorded jurisdictions by customer id
    customers: FxHashMap<CustomerId, Option<Jurisdiction>>,

    /// Named orders
    orders: OrdersFixture,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: FxHashMap::default(),
            schedules: FxHashMap::default(),
            tax_config: None,
            promotions: Vec::new(),
            customers: FxHashMap::default(),
            orders: OrdersFixture {
                orders: FxHashMap::default(),
            },
            currency: None,
        }
    }

    fn read<T: DeserializeOwned>(&self, category: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (key, product_fixture) in fixture.products {
            let product: Product<'static> = product_fixture.try_into()?;
            let currency = product.price.currency();

            match self.currency {
                Some(existing) if existing != currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => self.currency = Some(currency),
            }

            self.products.insert(ItemId::new(key), product);
        }

        Ok(self)
    }

    /// Load tax configuration and schedules from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_tax(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: TaxFixture = self.read("tax", name)?;

        for (item, components) in &fixture.schedules {
            self.schedules
                .insert(ItemId::new(item.as_str()), tax::parse_schedule(components)?);
        }

        self.tax_config = Some(fixture.config.into());

        Ok(self)
    }

    /// Load promotion records from a YAML fixture file
    ///
    /// Records are kept as stored; malformed ones are excluded when pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PromotionsFixture = self.read("promotions", name)?;

        self.promotions.extend(fixture.promotions);

        Ok(self)
    }

    /// Load customers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_customers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CustomersFixture = self.read("customers", name)?;

        for (id, customer) in fixture.customers {
            self.customers
                .insert(CustomerId::new(id), customer.jurisdiction());
        }

        Ok(self)
    }

    /// Load named orders from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OrdersFixture = self.read("orders", name)?;

        self.orders.orders.extend(fixture.orders);

        Ok(self)
    }

    /// Load a complete fixture set (every category with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_set(name)?;

        Ok(fixture)
    }

    /// Load every category of a fixture set into this fixture
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn load_set(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        self.load_products(name)?
            .load_tax(name)?
            .load_promotions(name)?
            .load_customers(name)?
            .load_orders(name)
    }

    /// Get a product by its item id
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'static>, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get all products by item id
    pub fn products(&self) -> &FxHashMap<ItemId, Product<'static>> {
        &self.products
    }

    /// Get all promotion records in catalog order
    pub fn promotions(&self) -> &[PromotionRecord] {
        &self.promotions
    }

    /// Build a named order from the loaded products
    ///
    /// # Errors
    ///
    /// Returns an error if the order or a referenced product is not found,
    /// a price override can't be parsed, or the order is invalid.
    pub fn order(&self, name: &str) -> Result<Order<'static>, FixtureError> {
        let currency = self.currency()?;
        let fixture = self
            .orders
            .orders
            .get(name)
            .ok_or_else(|| FixtureError::OrderNotFound(name.to_string()))?;

        let lines = fixture
            .lines
            .iter()
            .map(|line| -> Result<OrderLine<'static>, FixtureError> {
                let product = self.product(&line.item)?;

                let price = match &line.price {
                    Some(price) => {
                        let (minor_units, currency) = products::parse_price(price)?;

                        Money::from_minor(minor_units, currency)
                    }
                    None => product.price,
                };

                Ok(OrderLine::new(
                    line.item.as_str(),
                    product.name.clone(),
                    price,
                    line.quantity,
                )?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order::with_lines(lines, currency)?)
    }

    /// Get the customer a named order was placed by, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found.
    pub fn order_customer(&self, name: &str) -> Result<Option<CustomerId>, FixtureError> {
        self.orders
            .orders
            .get(name)
            .map(|order| order.customer.as_deref().map(CustomerId::new))
            .ok_or_else(|| FixtureError::OrderNotFound(name.to_string()))
    }

    /// Get the names of the loaded orders, sorted
    pub fn order_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.orders.orders.keys().map(String::as_str).collect();

        names.sort_unstable();

        names
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingSource for Fixture {
    fn active_promotions(&self) -> Result<Vec<PromotionRecord>, SourceError> {
        Ok(self.promotions.clone())
    }

    fn item_tax_schedule(&self, item: &ItemId) -> Result<Option<TaxSchedule>, SourceError> {
        Ok(self.schedules.get(item).cloned())
    }

    fn company_tax_config(&self) -> Result<TaxConfig, SourceError> {
        self.tax_config
            .ok_or(SourceError::Unavailable("tax configuration"))
    }

    fn customer_jurisdiction(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<Jurisdiction>, SourceError> {
        Ok(self.customers.get(customer).copied().flatten())
    }

    fn item_name(&self, item: &ItemId) -> Result<Option<String>, SourceError> {
        Ok(self.products.get(item).map(|product| product.name.clone()))
    }
}
