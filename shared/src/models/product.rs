//! Product Model

use serde::{Deserialize, Serialize};

/// Catalog product.
///
/// `price_bulk` is the price of a bundle of `bulk_quantity` units, not a
/// per-unit price. `reorder_qty` is counted in boxes of 10 units; 0 disables
/// reorder alerts for the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_cost: f64,
    pub price_single: f64,
    pub price_bulk: Option<f64>,
    pub bulk_quantity: i64,
    pub sale_price: Option<f64>,
    /// Sale window bounds, millis UTC, inclusive. Absent bound = unbounded.
    pub sale_start: Option<i64>,
    pub sale_end: Option<i64>,
    pub sale_min_qty: i64,
    pub stock: i64,
    pub reorder_qty: i64,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_cost: Option<f64>,
    pub price_single: f64,
    pub price_bulk: Option<f64>,
    pub bulk_quantity: Option<i64>,
    pub sale_price: Option<f64>,
    pub sale_start: Option<i64>,
    pub sale_end: Option<i64>,
    pub sale_min_qty: Option<i64>,
    pub stock: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub sort_order: Option<i64>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_cost: Option<f64>,
    pub price_single: Option<f64>,
    pub price_bulk: Option<f64>,
    pub bulk_quantity: Option<i64>,
    pub sale_price: Option<f64>,
    pub sale_start: Option<i64>,
    pub sale_end: Option<i64>,
    pub sale_min_qty: Option<i64>,
    pub stock: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}
