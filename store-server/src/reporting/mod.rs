//! Admin Reporting
//!
//! Read-only aggregations over orders, products, codes, and returns. No
//! business rules here — every number is a straight query over committed
//! state.

use crate::db::repository::product;
use crate::utils::AppResult;
use serde::Serialize;
use shared::models::Product;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Dashboard headline numbers.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_revenue: f64,
    pub orders_by_status: HashMap<String, i64>,
    pub total_users: i64,
    pub total_products: i64,
    pub recent_orders: Vec<RecentOrder>,
    pub low_stock_items: Vec<Product>,
    pub low_stock_threshold: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentOrder {
    pub order_number: String,
    pub total: f64,
    pub status: String,
    pub created_at: i64,
    pub full_name: String,
    pub email: String,
}

pub async fn dashboard_stats(pool: &SqlitePool, low_stock_threshold: i64) -> AppResult<DashboardStats> {
    let (total_orders, total_revenue): (i64, Option<f64>) =
        sqlx::query_as("SELECT COUNT(*), SUM(total) FROM orders")
            .fetch_one(pool)
            .await?;

    let status_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(pool)
            .await?;
    let orders_by_status = status_rows.into_iter().collect();

    let (total_users,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_admin = 0 AND is_active = 1")
            .fetch_one(pool)
            .await?;
    let (total_products,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(pool)
            .await?;

    let recent_orders = sqlx::query_as::<_, RecentOrder>(
        "SELECT o.order_number, o.total, o.status, o.created_at, u.full_name, u.email FROM orders o JOIN users u ON o.user_id = u.id ORDER BY o.created_at DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    let low_stock_items = product::find_low_stock(pool, low_stock_threshold).await?;

    Ok(DashboardStats {
        total_orders,
        total_revenue: total_revenue.unwrap_or(0.0),
        orders_by_status,
        total_users,
        total_products,
        recent_orders,
        low_stock_items,
        low_stock_threshold,
    })
}

/// Reorder suggestion for a low-stock product. `reorder_qty` is configured
/// in boxes of 10 units; 0 disables the suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderSuggestion {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub stock: i64,
    pub reorder_boxes: i64,
    pub reorder_units: i64,
    pub estimated_cost: f64,
}

pub async fn reorder_suggestions(
    pool: &SqlitePool,
    low_stock_threshold: i64,
) -> AppResult<Vec<ReorderSuggestion>> {
    let low = product::find_low_stock(pool, low_stock_threshold).await?;
    Ok(low
        .into_iter()
        .filter(|p| p.reorder_qty > 0)
        .map(|p| {
            let units = p.reorder_qty * 10;
            ReorderSuggestion {
                product_id: p.id,
                sku: p.sku,
                name: p.name,
                stock: p.stock,
                reorder_boxes: p.reorder_qty,
                reorder_units: units,
                estimated_cost: p.unit_cost * units as f64,
            }
        })
        .collect())
}

/// Per-code redemption figures.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CodeUsageRow {
    pub code: String,
    pub times_used: i64,
    pub usage_limit: Option<i64>,
    pub orders: i64,
    pub total_discounted: f64,
}

pub async fn code_usage(pool: &SqlitePool) -> AppResult<Vec<CodeUsageRow>> {
    let rows = sqlx::query_as::<_, CodeUsageRow>(
        "SELECT dc.code, dc.times_used, dc.usage_limit, COUNT(o.id) as orders, COALESCE(SUM(o.discount_amount), 0) as total_discounted FROM discount_codes dc LEFT JOIN orders o ON o.discount_code_id = dc.id GROUP BY dc.id ORDER BY dc.times_used DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns broken down by status, plus credited totals.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnsSummary {
    pub by_status: HashMap<String, i64>,
    pub total_credited: f64,
}

pub async fn returns_summary(pool: &SqlitePool) -> AppResult<ReturnsSummary> {
    let status_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM returns GROUP BY status")
            .fetch_all(pool)
            .await?;
    let (total_credited,): (Option<f64>,) = sqlx::query_as(
        "SELECT SUM(resolution_amount) FROM returns WHERE status = 'approved'",
    )
    .fetch_one(pool)
    .await?;
    Ok(ReturnsSummary {
        by_status: status_rows.into_iter().collect(),
        total_credited: total_credited.unwrap_or(0.0),
    })
}
