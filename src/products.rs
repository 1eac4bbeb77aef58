//! Products

use std::{borrow::Borrow, fmt};

use rusty_money::{Money, iso::Currency};

/// Scannable product identifier (usually an EAN-13 barcode).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Scannable identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Short description (size, variety)
    pub description: String,

    /// Unit price
    pub price: Money<'static, Currency>,

    /// Image reference (an emoji in the built-in catalog)
    pub image: String,

    /// Category
    pub category: String,
}

impl Product {
    /// Whether the name or description contains `needle`, ignoring case.
    ///
    /// `needle` is expected to be lowercase already.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;

    use super::*;

    fn milk() -> Product {
        Product {
            id: ProductId::from("8713800000015"),
            name: "AH Verse melk".to_string(),
            description: "Volle melk 1 liter".to_string(),
            price: Money::from_minor(129, EUR),
            image: "🥛".to_string(),
            category: "Zuivel".to_string(),
        }
    }

    #[test]
    fn product_id_displays_raw_identifier() {
        let id = ProductId::new("8713800000015");

        assert_eq!(id.to_string(), "8713800000015");
        assert_eq!(id.as_str(), "8713800000015");
    }

    #[test]
    fn matches_name_and_description() {
        let product = milk();

        assert!(product.matches_lowercase("melk"));
        assert!(product.matches_lowercase("1 liter"));
        assert!(!product.matches_lowercase("kaas"));
    }
}
