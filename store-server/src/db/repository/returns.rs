//! Return Request Repository

use super::{RepoError, RepoResult};
use shared::models::{ReturnItem, ReturnRequest};
use shared::types::{ResolutionType, ReturnStatus};
use sqlx::{SqliteConnection, SqlitePool};

const RETURN_SELECT: &str = "SELECT id, order_id, user_id, reason, detail, status, resolution_type, resolution_amount, admin_notes, created_at, updated_at FROM returns";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ReturnRequest>> {
    let sql = format!("{RETURN_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, ReturnRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, return_id: i64) -> RepoResult<Vec<ReturnItem>> {
    let rows = sqlx::query_as::<_, ReturnItem>(
        "SELECT id, return_id, order_item_id, quantity FROM return_items WHERE return_id = ?",
    )
    .bind(return_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_all(pool: &SqlitePool) -> RepoResult<Vec<ReturnRequest>> {
    let sql = format!("{RETURN_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ReturnRequest>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<ReturnRequest>> {
    let sql = format!("{RETURN_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ReturnRequest>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Any non-denied return already on the order? Denied returns don't block a
/// fresh request.
pub async fn blocking_return_exists(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<bool> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM returns WHERE order_id = ? AND status != 'denied'")
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

pub async fn insert_return(
    conn: &mut SqliteConnection,
    id: i64,
    order_id: i64,
    user_id: i64,
    reason: &str,
    detail: Option<&str>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO returns (id, order_id, user_id, reason, detail, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(id)
    .bind(order_id)
    .bind(user_id)
    .bind(reason)
    .bind(detail)
    .bind(ReturnStatus::Pending)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_return_item(
    conn: &mut SqliteConnection,
    return_id: i64,
    order_item_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO return_items (id, return_id, order_item_id, quantity) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(id)
    .bind(return_id)
    .bind(order_item_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

/// Move a return out of `pending`, recording the resolution. The guard on
/// the current status makes double-processing race-free — the second caller
/// sees zero affected rows.
pub async fn resolve_pending(
    conn: &mut SqliteConnection,
    id: i64,
    new_status: ReturnStatus,
    resolution_type: ResolutionType,
    resolution_amount: Option<f64>,
    admin_notes: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE returns SET status = ?1, resolution_type = ?2, resolution_amount = ?3, admin_notes = COALESCE(?4, admin_notes), updated_at = ?5 WHERE id = ?6 AND status = 'pending'",
    )
    .bind(new_status)
    .bind(resolution_type)
    .bind(resolution_amount)
    .bind(admin_notes)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Final step of the full-refund path: only a return currently
/// `refund_pending` may be completed.
pub async fn complete_refund(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE returns SET status = 'refunded', updated_at = ? WHERE id = ? AND status = 'refund_pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Quantity already committed to a return line, for over-return checks.
pub async fn returned_quantity_for_item(
    conn: &mut SqliteConnection,
    order_item_id: i64,
) -> RepoResult<i64> {
    let (sum,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(ri.quantity), 0) FROM return_items ri JOIN returns r ON ri.return_id = r.id WHERE ri.order_item_id = ? AND r.status != 'denied'",
    )
    .bind(order_item_id)
    .fetch_one(conn)
    .await?;
    Ok(sum)
}

/// Guard against `NotFound` leaking as a silent no-op.
pub async fn require_exists(pool: &SqlitePool, id: i64) -> RepoResult<ReturnRequest> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Return {id} not found")))
}
