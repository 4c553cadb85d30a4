//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT id, sku, name, description, category, unit_cost, price_single, price_bulk, bulk_quantity, sale_price, sale_start, sale_end, sale_min_qty, stock, reorder_qty, sort_order, is_active, created_at, updated_at FROM products";

/// Active products, storefront order.
pub async fn find_all_active(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE is_active = 1 ORDER BY sort_order, name");
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Every product including deactivated ones (admin view).
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY sort_order, name");
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same lookup from inside an open transaction, so the settlement engine
/// prices the row it is about to decrement.
pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_sku(pool: &SqlitePool, sku: &str) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE sku = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(sku)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Distinct categories of active products.
pub async fn find_categories(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT category FROM products WHERE is_active = 1 AND category IS NOT NULL ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(c,)| c).collect())
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let sku = data.sku.to_uppercase();
    let result = sqlx::query(
        "INSERT INTO products (id, sku, name, description, category, unit_cost, price_single, price_bulk, bulk_quantity, sale_price, sale_start, sale_end, sale_min_qty, stock, reorder_qty, sort_order, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, 1, ?17, ?17)",
    )
    .bind(id)
    .bind(&sku)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.category)
    .bind(data.unit_cost.unwrap_or(0.0))
    .bind(data.price_single)
    .bind(data.price_bulk)
    .bind(data.bulk_quantity.unwrap_or(10))
    .bind(data.sale_price)
    .bind(data.sale_start)
    .bind(data.sale_end)
    .bind(data.sale_min_qty.unwrap_or(1))
    .bind(data.stock.unwrap_or(0))
    .bind(data.reorder_qty.unwrap_or(0))
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => find_by_id(pool, id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create product".into())),
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => Err(RepoError::Duplicate(format!("SKU {sku} already exists"))),
            other => Err(other),
        },
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET sku = COALESCE(?1, sku), name = COALESCE(?2, name), description = COALESCE(?3, description), category = COALESCE(?4, category), unit_cost = COALESCE(?5, unit_cost), price_single = COALESCE(?6, price_single), price_bulk = COALESCE(?7, price_bulk), bulk_quantity = COALESCE(?8, bulk_quantity), sale_price = COALESCE(?9, sale_price), sale_start = COALESCE(?10, sale_start), sale_end = COALESCE(?11, sale_end), sale_min_qty = COALESCE(?12, sale_min_qty), stock = COALESCE(?13, stock), reorder_qty = COALESCE(?14, reorder_qty), sort_order = COALESCE(?15, sort_order), is_active = COALESCE(?16, is_active), updated_at = ?17 WHERE id = ?18",
    )
    .bind(data.sku.map(|s| s.to_uppercase()))
    .bind(data.name)
    .bind(data.description)
    .bind(data.category)
    .bind(data.unit_cost)
    .bind(data.price_single)
    .bind(data.price_bulk)
    .bind(data.bulk_quantity)
    .bind(data.sale_price)
    .bind(data.sale_start)
    .bind(data.sale_end)
    .bind(data.sale_min_qty)
    .bind(data.stock)
    .bind(data.reorder_qty)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft delete — products referenced by orders are never hard-deleted.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn restore(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE products SET is_active = 1, updated_at = ? WHERE id = ? AND is_active = 0")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Overwrite stock levels for a batch of products. Returns how many rows
/// actually changed.
pub async fn bulk_update_stock(pool: &SqlitePool, updates: &[(i64, i64)]) -> RepoResult<u64> {
    let now = shared::util::now_millis();
    let mut updated = 0;
    for (id, stock) in updates {
        if *stock < 0 {
            return Err(RepoError::Validation(format!(
                "stock must be non-negative, got {stock} for product {id}"
            )));
        }
        let rows = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
        updated += rows.rows_affected();
    }
    Ok(updated)
}

/// Active products at or below the stock threshold.
pub async fn find_low_stock(pool: &SqlitePool, threshold: i64) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE stock <= ? AND is_active = 1 ORDER BY stock");
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(threshold)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
