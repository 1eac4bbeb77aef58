//! Random sample carts
//!
//! Demo helper that fills a cart with random catalog products, one to three
//! units each.

use std::ops::RangeInclusive;

use rand::{Rng, seq::SliceRandom};

use crate::{catalog::Catalog, products::Product};

/// Units drawn per pick.
pub const SAMPLE_QUANTITY: RangeInclusive<u32> = 1..=3;

/// Draw `count` random products with random quantities.
///
/// The same product may be drawn more than once; callers merge draws by
/// identifier when adding them to a cart. An empty catalog yields no draws.
pub fn draw<C, R>(catalog: &C, rng: &mut R, count: usize) -> Vec<(Product, u32)>
where
    C: Catalog + ?Sized,
    R: Rng + ?Sized,
{
    let products = catalog.all();

    (0..count)
        .filter_map(|_| {
            let product = products.choose(&mut *rng)?.clone();
            let quantity = rng.gen_range(SAMPLE_QUANTITY);

            Some((product, quantity))
        })
        .collect()
}
