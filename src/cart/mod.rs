//! Cart
//!
//! The cart keeps one line per product identifier, in the order products were
//! first added. Prices are captured when a line is created, so later catalog
//! changes never reprice an in-progress cart.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    catalog::Catalog,
    pricing::{line_total, sum_minor},
    products::{Product, ProductId},
};

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The catalog has no product with this identifier.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart has no line for this identifier.
    #[error("No cart line for product {0}")]
    LineNotFound(ProductId),

    /// A product's currency differs from the cart currency (product, product currency, cart currency).
    #[error("Product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),
}

/// One aggregated row of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    id: ProductId,
    name: String,
    description: String,
    unit_price: Money<'static, Currency>,
    quantity: u32,
}

impl CartLine {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Product identifier
    #[must_use]
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Product name at the time the line was created
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Product description at the time the line was created
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unit price at the time the line was created
    #[must_use]
    pub fn unit_price(&self) -> Money<'static, Currency> {
        self.unit_price
    }

    /// Number of units, always at least one
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        line_total(&self.unit_price, self.quantity)
    }
}

/// Read-only copy of the cart with derived totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    item_count: u64,
    subtotal: Money<'static, Currency>,
}

impl CartSnapshot {
    /// Lines in display order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line for `id`, if present
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == *id)
    }

    /// Total number of units across all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Sum of all line totals
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Whether the cart had no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency of the cart
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.subtotal.currency()
    }
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Look `id` up in the catalog and add `quantity` units of it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ProductNotFound`] if the catalog has no such
    /// product, or [`CartError::CurrencyMismatch`] if it is priced in another
    /// currency.
    pub fn add_or_increment<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let product = catalog
            .lookup(id)
            .ok_or_else(|| CartError::ProductNotFound(id.clone()))?;

        self.add_product(&product, quantity)
    }

    /// Add `quantity` units of an already looked-up product.
    ///
    /// An existing line is incremented and keeps its original price snapshot;
    /// otherwise a new line is appended. Adding zero units is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the product is priced in
    /// another currency.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let product_currency = product.price.currency();

        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                product.id.clone(),
                product_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if quantity > 0 {
            match self.line_mut(&product.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => self.lines.push(CartLine::from_product(product, quantity)),
            }
        }

        Ok(self.snapshot())
    }

    /// Set the quantity of an existing line; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no line for `id`.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> Result<CartSnapshot, CartError> {
        let position = self
            .position(id)
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;

        if quantity <= 0 {
            self.lines.remove(position);
        } else if let Some(line) = self.lines.get_mut(position) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        Ok(self.snapshot())
    }

    /// Change the quantity of an existing line by `delta`; dropping to zero or
    /// less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no line for `id`.
    pub fn adjust_quantity(&mut self, id: &ProductId, delta: i64) -> Result<CartSnapshot, CartError> {
        let current = self
            .line_mut(id)
            .map(|line| i64::from(line.quantity))
            .ok_or_else(|| CartError::LineNotFound(id.clone()))?;

        self.set_quantity(id, current.saturating_add(delta))
    }

    /// Remove the line for `id`. Removing a missing line is a no-op.
    pub fn remove(&mut self, id: &ProductId) -> CartSnapshot {
        self.lines.retain(|line| line.id != *id);

        self.snapshot()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Copy of the current lines with derived totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            item_count: self.item_count(),
            subtotal: self.subtotal(),
        }
    }

    /// `Σ unit_price × quantity`
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        sum_minor(
            self.lines.iter().map(|line| line.total().to_minor_units()),
            self.currency,
        )
    }

    /// `Σ quantity`
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.id == *id)
    }

    fn line_mut(&mut self, id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.id == *id)
    }
}
