//! Credit Ledger
//!
//! Every balance movement is a ledger append plus a cached-balance update in
//! the caller's transaction — the two can never drift apart under a crash
//! because they commit together. The ledger is the source of truth; the
//! cached column exists so checkout doesn't re-sum history.

use crate::db::repository::referral;
use crate::money::{to_decimal, to_f64};
use crate::utils::{AppError, AppResult};
use rust_decimal::Decimal;
use shared::types::LedgerEntryType;
use sqlx::{SqliteConnection, SqlitePool};

/// Grant credit: referral commission, return resolution, or manual credit.
/// `amount` must be positive.
pub async fn credit(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Decimal,
    order_id: Option<i64>,
    entry_type: LedgerEntryType,
    description: &str,
) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Credit amount must be positive"));
    }
    if entry_type == LedgerEntryType::Used {
        return Err(AppError::validation(
            "Use debit() for credit consumption entries",
        ));
    }

    let amount_f = to_f64(amount);
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET referral_credit = referral_credit + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(amount_f)
    .bind(now)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(AppError::not_found(format!("User {user_id} not found")));
    }

    referral::append(conn, user_id, order_id, entry_type, amount_f, description).await?;
    Ok(())
}

/// Consume credit against an order. The balance guard sits inside the
/// UPDATE itself, so two settlements racing over the same credit cannot both
/// succeed — the loser sees zero affected rows and gets `Conflict`.
pub async fn debit(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Decimal,
    order_id: Option<i64>,
    description: &str,
) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Debit amount must be positive"));
    }

    let amount_f = to_f64(amount);
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET referral_credit = referral_credit - ?1, updated_at = ?2 WHERE id = ?3 AND referral_credit >= ?1",
    )
    .bind(amount_f)
    .bind(now)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(AppError::conflict(format!(
            "Insufficient credit: user {user_id} cannot cover {amount_f:.2}"
        )));
    }

    referral::append(
        conn,
        user_id,
        order_id,
        LedgerEntryType::Used,
        -amount_f,
        description,
    )
    .await?;
    Ok(())
}

/// Manual admin correction, either sign. Negative adjustments are guarded
/// the same way as debits so the balance never goes below zero.
pub async fn adjust(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Decimal,
    description: &str,
) -> AppResult<()> {
    if amount == Decimal::ZERO {
        return Err(AppError::validation("Adjustment amount must be non-zero"));
    }

    let amount_f = to_f64(amount);
    let now = shared::util::now_millis();
    let rows = if amount > Decimal::ZERO {
        sqlx::query(
            "UPDATE users SET referral_credit = referral_credit + ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(amount_f)
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            "UPDATE users SET referral_credit = referral_credit + ?1, updated_at = ?2 WHERE id = ?3 AND referral_credit >= ?4",
        )
        .bind(amount_f)
        .bind(now)
        .bind(user_id)
        .bind(-amount_f)
        .execute(&mut *conn)
        .await?
    };
    if rows.rows_affected() == 0 {
        return Err(AppError::conflict(format!(
            "Adjustment would drive user {user_id} balance negative (or user missing)"
        )));
    }

    referral::append(
        conn,
        user_id,
        None,
        LedgerEntryType::Adjustment,
        amount_f,
        description,
    )
    .await?;
    Ok(())
}

/// Cached balance.
pub async fn balance(pool: &SqlitePool, user_id: i64) -> AppResult<f64> {
    let row: Option<(f64,)> = sqlx::query_as("SELECT referral_credit FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(|(b,)| b)
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
}

/// Ledger-vs-cache comparison for the periodic reconciliation job.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub cached_balance: f64,
    pub ledger_sum: f64,
    pub consistent: bool,
}

pub async fn reconcile(pool: &SqlitePool, user_id: i64) -> AppResult<Reconciliation> {
    let cached = balance(pool, user_id).await?;
    let ledger_sum = referral::sum_for_user(pool, user_id).await?;
    Ok(Reconciliation {
        cached_balance: cached,
        ledger_sum,
        consistent: crate::money::money_eq(cached, ledger_sum),
    })
}
