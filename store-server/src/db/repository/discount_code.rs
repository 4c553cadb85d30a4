//! Discount Code Repository

use super::{RepoError, RepoResult};
use shared::models::{DiscountCode, DiscountCodeCreate, DiscountCodeUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const CODE_SELECT: &str = "SELECT id, code, description, discount_percent, discount_amount, min_order_amount, usage_limit, times_used, referrer_user_id, commission_percent, is_active, expires_at, created_at, updated_at FROM discount_codes";

/// Codes are stored and matched uppercase.
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<DiscountCode>> {
    let sql = format!("{CODE_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, DiscountCode>(&sql)
        .bind(code.trim().to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same lookup from inside an open transaction, so the settlement engine
/// evaluates the row it is about to mutate.
pub async fn find_by_code_tx(
    conn: &mut SqliteConnection,
    code: &str,
) -> RepoResult<Option<DiscountCode>> {
    let sql = format!("{CODE_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, DiscountCode>(&sql)
        .bind(code.trim().to_uppercase())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiscountCode>> {
    let sql = format!("{CODE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, DiscountCode>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiscountCode>> {
    let sql = format!("{CODE_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DiscountCode>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: DiscountCodeCreate) -> RepoResult<DiscountCode> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let code = data.code.trim().to_uppercase();
    let result = sqlx::query(
        "INSERT INTO discount_codes (id, code, description, discount_percent, discount_amount, min_order_amount, usage_limit, times_used, referrer_user_id, commission_percent, is_active, expires_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, 1, ?10, ?11, ?11)",
    )
    .bind(id)
    .bind(&code)
    .bind(&data.description)
    .bind(data.discount_percent.unwrap_or(0.0))
    .bind(data.discount_amount.unwrap_or(0.0))
    .bind(data.min_order_amount.unwrap_or(0.0))
    .bind(data.usage_limit)
    .bind(data.referrer_user_id)
    .bind(data.commission_percent.unwrap_or(0.0))
    .bind(data.expires_at)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => find_by_id(pool, id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create discount code".into())),
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => {
                Err(RepoError::Duplicate(format!("Code {code} already exists")))
            }
            other => Err(other),
        },
    }
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: DiscountCodeUpdate,
) -> RepoResult<DiscountCode> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE discount_codes SET description = COALESCE(?1, description), discount_percent = COALESCE(?2, discount_percent), discount_amount = COALESCE(?3, discount_amount), min_order_amount = COALESCE(?4, min_order_amount), usage_limit = COALESCE(?5, usage_limit), commission_percent = COALESCE(?6, commission_percent), is_active = COALESCE(?7, is_active), expires_at = COALESCE(?8, expires_at), updated_at = ?9 WHERE id = ?10",
    )
    .bind(data.description)
    .bind(data.discount_percent)
    .bind(data.discount_amount)
    .bind(data.min_order_amount)
    .bind(data.usage_limit)
    .bind(data.commission_percent)
    .bind(data.is_active)
    .bind(data.expires_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Discount code {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Discount code {id} not found")))
}

pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE discount_codes SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Race-free usage increment: the guard re-checks the limit inside the
/// UPDATE, so two concurrent settlements cannot both take the last slot.
/// Returns false when the limit is exhausted.
pub async fn increment_usage(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE discount_codes SET times_used = times_used + 1, updated_at = ?1 WHERE id = ?2 AND is_active = 1 AND (usage_limit IS NULL OR times_used < usage_limit)",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
