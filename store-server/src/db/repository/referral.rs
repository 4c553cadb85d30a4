//! Referral Credit Ledger Repository
//!
//! Rows are append-only; the cached `users.referral_credit` moves in the
//! same transaction as every append (see `credit::ledger`).

use super::RepoResult;
use shared::models::ReferralTransaction;
use shared::types::LedgerEntryType;
use sqlx::{SqliteConnection, SqlitePool};

const LEDGER_SELECT: &str = "SELECT id, user_id, order_id, entry_type, amount, description, created_at FROM referral_transactions";

/// Append a ledger row. `amount` is signed: negative for `used`.
pub async fn append(
    conn: &mut SqliteConnection,
    user_id: i64,
    order_id: Option<i64>,
    entry_type: LedgerEntryType,
    amount: f64,
    description: &str,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO referral_transactions (id, user_id, order_id, entry_type, amount, description, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(user_id)
    .bind(order_id)
    .bind(entry_type)
    .bind(amount)
    .bind(description)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

/// A user's ledger, newest first.
pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<ReferralTransaction>> {
    let sql = format!("{LEDGER_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ReferralTransaction>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Signed sum of a user's ledger rows — the source of truth the cached
/// balance must always match.
pub async fn sum_for_user(pool: &SqlitePool, user_id: i64) -> RepoResult<f64> {
    let (sum,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM referral_transactions WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}
