//! Product Fixtures
//!
//! Loads a catalog from a YAML file of products keyed by barcode:
//!
//! ```yaml
//! products:
//!   "8713800000015":
//!     name: "AH Verse melk"
//!     description: "Volle melk 1 liter"
//!     price: "1.29 EUR"
//!     image: "🥛"
//!     category: "Zuivel"
//! ```

use std::{collections::BTreeSet, fs, path::Path};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::Catalog,
    products::{Product, ProductId},
};

const STORE_FIXTURE_YAML: &str = include_str!("../../fixtures/products/store.yml");

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

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Empty identifier key
    #[error("Product identifier must not be empty")]
    EmptyIdentifier,

    /// Two keys name the same product once trimmed
    #[error("Duplicate product identifier: {0}")]
    DuplicateIdentifier(String),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of barcode -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Product description
    #[serde(default)]
    pub description: String,

    /// Product price (e.g., "1.29 EUR")
    pub price: String,

    /// Image reference
    #[serde(default)]
    pub image: String,

    /// Category
    pub category: String,
}

impl ProductFixture {
    fn into_product(self, id: ProductId) -> Result<Product, FixtureError> {
        let (minor_units, currency) = parse_price(&self.price)?;

        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            price: Money::from_minor(minor_units, currency),
            image: self.image,
            category: self.category,
        })
    }
}

/// Parse price string (e.g., "1.29 EUR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    // Prices are exact to the cent; anything finer would need rounding.
    if amount.is_sign_negative() || amount.normalize().scale() > 2 {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match currency_code {
        "EUR" => EUR,
        "GBP" => GBP,
        "USD" => USD,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Catalog backed by a product fixture.
#[derive(Debug, Clone)]
pub struct FixtureCatalog {
    /// Products sorted by identifier
    products: Vec<Product>,

    /// Identifier -> index into `products`
    index: FxHashMap<ProductId, usize>,

    /// Currency shared by every product
    currency: &'static Currency,
}

impl FixtureCatalog {
    /// The catalog bundled with the kiosk.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled fixture fails to parse.
    pub fn store() -> Result<Self, FixtureError> {
        Self::from_yaml(STORE_FIXTURE_YAML)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if products
    /// are priced in different currencies.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Load a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed, or if products are
    /// priced in different currencies.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(yaml)?;

        let mut products = fixture
            .products
            .into_iter()
            .map(|(key, product)| {
                let key = key.trim();

                if key.is_empty() {
                    return Err(FixtureError::EmptyIdentifier);
                }

                product.into_product(ProductId::from(key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        products.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(id) = products.windows(2).find_map(|pair| match pair {
            [a, b] if a.id == b.id => Some(a.id.to_string()),
            _ => None,
        }) {
            return Err(FixtureError::DuplicateIdentifier(id));
        }

        let currency = products
            .first()
            .map_or(EUR, |product| product.price.currency());

        if let Some(product) = products
            .iter()
            .find(|product| product.price.currency() != currency)
        {
            return Err(FixtureError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                product.price.currency().iso_alpha_code.to_string(),
            ));
        }

        let index = products
            .iter()
            .enumerate()
            .map(|(idx, product)| (product.id.clone(), idx))
            .collect();

        debug!(products = products.len(), currency = currency.iso_alpha_code, "loaded catalog");

        Ok(Self {
            products,
            index,
            currency,
        })
    }

    /// Currency every product is priced in (EUR for an empty catalog).
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for FixtureCatalog {
    fn lookup(&self, id: &ProductId) -> Option<Product> {
        self.index
            .get(id)
            .and_then(|idx| self.products.get(*idx))
            .cloned()
    }

    fn search(&self, term: &str) -> Vec<Product> {
        let needle = term.to_lowercase();

        self.products
            .iter()
            .filter(|product| product.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    fn by_category(&self, category: &str) -> Vec<Product> {
        self.products
            .iter()
            .filter(|product| product.category == category)
            .cloned()
            .collect()
    }

    fn categories(&self) -> BTreeSet<String> {
        self.products
            .iter()
            .map(|product| product.category.clone())
            .collect()
    }

    fn all(&self) -> Vec<Product> {
        self.products.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("1.29EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("1.29 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price("-1.29 EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_reads_exact_minor_units() -> TestResult {
        let (minor, currency) = parse_price("1.29 EUR")?;

        assert_eq!(minor, 129);
        assert_eq!(currency, EUR);

        let (minor, _) = parse_price("0.10 EUR")?;

        assert_eq!(minor, 10);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_sub_cent_amounts() {
        assert!(matches!(parse_price("1.295 EUR"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("0.001 EUR"), Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_accepts_trailing_zeros() -> TestResult {
        let (minor, _) = parse_price("1.2900 EUR")?;

        assert_eq!(minor, 129);

        let (minor, _) = parse_price("3 EUR")?;

        assert_eq!(minor, 300);

        Ok(())
    }

    #[test]
    fn keys_that_collide_after_trimming_are_rejected() {
        let yaml = r#"
products:
  "123":
    name: "A"
    price: "1.00 EUR"
    category: "X"
  " 123":
    name: "B"
    price: "2.00 EUR"
    category: "X"
"#;

        assert!(matches!(
            FixtureCatalog::from_yaml(yaml),
            Err(FixtureError::DuplicateIdentifier(id)) if id == "123"
        ));
    }

    #[test]
    fn store_catalog_loads() -> TestResult {
        let catalog = FixtureCatalog::store()?;

        assert_eq!(catalog.len(), 20);
        assert_eq!(catalog.currency(), EUR);

        Ok(())
    }

    #[test]
    fn lookup_returns_product_or_none() -> TestResult {
        let catalog = FixtureCatalog::store()?;

        let milk = catalog.lookup(&ProductId::from("8713800000015"));

        assert_eq!(milk.as_ref().map(|p| p.name.as_str()), Some("AH Verse melk"));
        assert_eq!(
            milk.map(|p| p.price),
            Some(Money::from_minor(129, EUR))
        );
        assert!(catalog.lookup(&ProductId::from("000")).is_none());

        Ok(())
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() -> TestResult {
        let catalog = FixtureCatalog::store()?;

        let names: Vec<String> = catalog.search("MELK").into_iter().map(|p| p.name).collect();

        assert!(names.contains(&"AH Verse melk".to_string()));
        assert!(names.contains(&"AH Chocolade".to_string()), "Melkchocolade description");

        Ok(())
    }

    #[test]
    fn by_category_and_categories() -> TestResult {
        let catalog = FixtureCatalog::store()?;

        assert_eq!(catalog.by_category("Zuivel").len(), 5);
        assert!(catalog.by_category("Onbekend").is_empty());

        let categories: Vec<String> = catalog.categories().into_iter().collect();

        assert_eq!(
            categories,
            vec![
                "Beleg",
                "Brood & Banket",
                "Frisdrank",
                "Groente & Fruit",
                "Koffie & Thee",
                "Pasta & Rijst",
                "Snoep & Koek",
                "Vlees & Vis",
                "Zuivel",
            ]
        );

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let yaml = r#"
products:
  "1":
    name: "A"
    price: "1.00 EUR"
    category: "X"
  "2":
    name: "B"
    price: "1.00 GBP"
    category: "X"
"#;

        assert!(matches!(
            FixtureCatalog::from_yaml(yaml),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn from_path_reads_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;

        writeln!(
            file,
            "products:\n  \"42\":\n    name: \"Test\"\n    price: \"2.50 EUR\"\n    category: \"Test\""
        )?;

        let catalog = FixtureCatalog::from_path(file.path())?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.lookup(&ProductId::from("42")).map(|p| p.price),
            Some(Money::from_minor(250, EUR))
        );

        Ok(())
    }
}
