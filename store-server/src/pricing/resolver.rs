//! Unit Price Resolver
//!
//! Pure price resolution — stock checks and mutation belong to the
//! settlement engine. Priority order, first match wins:
//!
//! 1. Sale: `sale_price` set and > 0, `qty >= sale_min_qty`, and `now`
//!    inside the inclusive `[sale_start, sale_end]` window (either bound may
//!    be absent, meaning unbounded on that side).
//! 2. Bulk: `price_bulk` set and `qty >= bulk_quantity`. The unit price is
//!    `price_bulk / bulk_quantity` — a true per-unit price derived from the
//!    bundle price, kept as a Decimal so nothing rounds mid-calculation.
//! 3. Single: `price_single`.

use crate::money::to_decimal;
use rust_decimal::Decimal;
use shared::models::Product;
use shared::types::PriceBasis;

/// Resolved unit price plus which rule produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    /// Per-unit price, unrounded.
    pub unit_price: Decimal,
    pub basis: PriceBasis,
}

impl ResolvedPrice {
    /// Line extension = unit_price * qty, still unrounded.
    pub fn extension(&self, quantity: i64) -> Decimal {
        self.unit_price * Decimal::from(quantity)
    }
}

/// Resolve the applicable unit price for `quantity` units at `now_millis`.
pub fn resolve_unit_price(product: &Product, quantity: i64, now_millis: i64) -> ResolvedPrice {
    if sale_applies(product, quantity, now_millis) {
        // sale_applies guarantees sale_price is present
        let sale_price = product.sale_price.unwrap_or(0.0);
        return ResolvedPrice {
            unit_price: to_decimal(sale_price),
            basis: PriceBasis::Sale,
        };
    }

    if let Some(price_bulk) = product.price_bulk
        && price_bulk > 0.0
        && product.bulk_quantity > 0
        && quantity >= product.bulk_quantity
    {
        return ResolvedPrice {
            unit_price: to_decimal(price_bulk) / Decimal::from(product.bulk_quantity),
            basis: PriceBasis::Bulk,
        };
    }

    ResolvedPrice {
        unit_price: to_decimal(product.price_single),
        basis: PriceBasis::Single,
    }
}

/// Sale price applies when it is set, the quantity meets the minimum, and
/// the sale window contains `now`.
fn sale_applies(product: &Product, quantity: i64, now_millis: i64) -> bool {
    let Some(sale_price) = product.sale_price else {
        return false;
    };
    if sale_price <= 0.0 {
        return false;
    }
    if quantity < product.sale_min_qty {
        return false;
    }
    window_contains(product.sale_start, product.sale_end, now_millis)
}

/// Inclusive window check; a missing bound is unbounded on that side.
fn window_contains(start: Option<i64>, end: Option<i64>, now_millis: i64) -> bool {
    if let Some(start) = start
        && now_millis < start
    {
        return false;
    }
    if let Some(end) = end
        && now_millis > end
    {
        return false;
    }
    true
}
