//! Order Repository
//!
//! Settlement-time writes take `&mut SqliteConnection` so they run inside
//! the engine's transaction; reads take the pool.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderItemDetail, OrderWithItems};
use shared::types::{DeliveryMethod, OrderStatus, PriceBasis};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, user_id, order_number, subtotal, discount_amount, discount_code_id, shipping_cost, credit_applied, total, status, delivery_method, notes, admin_notes, shipping_address, tracking_number, created_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price, oi.price_basis, p.name, p.sku FROM order_items oi JOIN products p ON oi.product_id = p.id";

/// Fields persisted for a freshly settled order.
#[derive(Debug, Clone)]
pub struct NewOrderRow {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub discount_code_id: Option<i64>,
    pub shipping_cost: f64,
    pub credit_applied: f64,
    pub total: f64,
    pub delivery_method: DeliveryMethod,
    pub notes: Option<String>,
    pub shipping_address: Option<String>,
}

pub async fn insert_order(conn: &mut SqliteConnection, row: &NewOrderRow) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO orders (id, user_id, order_number, subtotal, discount_amount, discount_code_id, shipping_cost, credit_applied, total, status, delivery_method, notes, shipping_address, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(&row.order_number)
    .bind(row.subtotal)
    .bind(row.discount_amount)
    .bind(row.discount_code_id)
    .bind(row.shipping_cost)
    .bind(row.credit_applied)
    .bind(row.total)
    .bind(OrderStatus::PendingPayment)
    .bind(row.delivery_method)
    .bind(&row.notes)
    .bind(&row.shipping_address)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price: f64,
    price_basis: PriceBasis,
) -> RepoResult<()> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, price_basis) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(price_basis)
    .execute(conn)
    .await?;
    Ok(())
}

/// Race-free stock decrement: the guard re-checks availability inside the
/// UPDATE, so two settlements cannot both take the last unit. Returns false
/// when stock is insufficient.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same lookup from inside an open transaction.
pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_number(pool: &SqlitePool, order_number: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE order_number = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItemDetail>> {
    let sql = format!("{ITEM_SELECT} WHERE oi.order_id = ?");
    let rows = sqlx::query_as::<_, OrderItemDetail>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Line items from inside an open transaction.
pub async fn find_items_tx(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OrderItemDetail>> {
    let sql = format!("{ITEM_SELECT} WHERE oi.order_id = ?");
    let rows = sqlx::query_as::<_, OrderItemDetail>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// A customer's orders, newest first, each with its line items.
pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<OrderWithItems>> {
    let sql = format!("{ORDER_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    with_items(pool, orders).await
}

/// All orders (admin), optionally filtered by status, newest first.
pub async fn list_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
) -> RepoResult<Vec<OrderWithItems>> {
    let orders = match status {
        Some(s) => {
            let sql = format!("{ORDER_SELECT} WHERE status = ? ORDER BY created_at DESC");
            sqlx::query_as::<_, Order>(&sql).bind(s).fetch_all(pool).await?
        }
        None => {
            let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC");
            sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?
        }
    };
    with_items(pool, orders).await
}

async fn with_items(pool: &SqlitePool, orders: Vec<Order>) -> RepoResult<Vec<OrderWithItems>> {
    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = find_items(pool, order.id).await?;
        result.push(OrderWithItems { order, items });
    }
    Ok(result)
}

/// Status + fulfillment metadata update. Never touches money fields.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: OrderStatus,
    admin_notes: Option<&str>,
    tracking_number: Option<&str>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, admin_notes = COALESCE(?2, admin_notes), tracking_number = COALESCE(?3, tracking_number), updated_at = ?4 WHERE id = ?5",
    )
    .bind(status)
    .bind(admin_notes)
    .bind(tracking_number)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Money-field override for the explicit admin edit path. The caller is
/// responsible for recomputing `total` and appending its audit line.
pub async fn update_money(
    pool: &SqlitePool,
    id: i64,
    discount_amount: f64,
    shipping_cost: f64,
    total: f64,
    admin_notes: &str,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET discount_amount = ?1, shipping_cost = ?2, total = ?3, admin_notes = ?4, updated_at = ?5 WHERE id = ?6",
    )
    .bind(discount_amount)
    .bind(shipping_cost)
    .bind(total)
    .bind(admin_notes)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}
