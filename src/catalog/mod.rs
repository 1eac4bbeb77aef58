//! Catalog
//!
//! The product catalog is a read-only collaborator: it is loaded once at
//! startup and only ever queried by the cart and the session.

use std::collections::BTreeSet;

use mockall::automock;

use crate::products::{Product, ProductId};

pub mod fixture;

pub use fixture::{FixtureCatalog, FixtureError};

/// Read-only product lookup service.
#[automock]
pub trait Catalog {
    /// Look up a product by its exact identifier.
    fn lookup(&self, id: &ProductId) -> Option<Product>;

    /// Products whose name or description contains `term`, ignoring case.
    fn search(&self, term: &str) -> Vec<Product>;

    /// Products in exactly this category.
    fn by_category(&self, category: &str) -> Vec<Product>;

    /// Distinct category names, sorted.
    fn categories(&self) -> BTreeSet<String>;

    /// Every product, in catalog order.
    fn all(&self) -> Vec<Product>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn lookup(&self, id: &ProductId) -> Option<Product> {
        (**self).lookup(id)
    }

    fn search(&self, term: &str) -> Vec<Product> {
        (**self).search(term)
    }

    fn by_category(&self, category: &str) -> Vec<Product> {
        (**self).by_category(category)
    }

    fn categories(&self) -> BTreeSet<String> {
        (**self).categories()
    }

    fn all(&self) -> Vec<Product> {
        (**self).all()
    }
}

/// Filter a catalog the way the product browser does: optional search term,
/// then optional exact category.
pub fn filter_products<C: Catalog + ?Sized>(
    catalog: &C,
    term: Option<&str>,
    category: Option<&str>,
) -> Vec<Product> {
    let products = match term.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => catalog.search(term),
        None => catalog.all(),
    };

    match category.filter(|category| !category.is_empty()) {
        Some(category) => products
            .into_iter()
            .filter(|product| product.category == category)
            .collect(),
        None => products,
    }
}
