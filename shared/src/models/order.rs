//! Order Models

use crate::types::{DeliveryMethod, OrderStatus, PriceBasis};
use serde::{Deserialize, Serialize};

/// Immutable financial snapshot taken at settlement.
///
/// `total = max(0, subtotal - discount_amount + shipping_cost - credit_applied)`.
/// Money fields are never recomputed after creation except through the
/// explicit admin edit, which appends an audit line to `admin_notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub discount_code_id: Option<i64>,
    pub shipping_cost: f64,
    pub credit_applied: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line with the unit price actually charged, frozen at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub price_basis: PriceBasis,
}

/// Order line joined with product display fields (list/detail views).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub price_basis: PriceBasis,
    pub name: String,
    pub sku: String,
}

/// Order plus its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}
