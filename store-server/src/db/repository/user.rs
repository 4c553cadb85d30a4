//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserCreate, UserUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const USER_SELECT: &str = "SELECT id, full_name, email, phone, organization, country, is_admin, email_verified, referral_credit, is_active, created_at, updated_at FROM users";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same lookup from inside an open transaction, so the settlement engine
/// reads the balance it is about to debit.
pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE email = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("{USER_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Register a new account. Emails are stored lowercase; duplicates surface
/// as `Duplicate`.
pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let email = data.email.to_lowercase();
    let result = sqlx::query(
        "INSERT INTO users (id, full_name, email, phone, organization, country, is_admin, email_verified, referral_credit, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, 0, 1, ?7, ?7)",
    )
    .bind(id)
    .bind(&data.full_name)
    .bind(&email)
    .bind(&data.phone)
    .bind(&data.organization)
    .bind(&data.country)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => find_by_id(pool, id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create user".into())),
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => {
                Err(RepoError::Duplicate(format!("Email {email} already registered")))
            }
            other => Err(other),
        },
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET full_name = COALESCE(?1, full_name), email = COALESCE(?2, email), phone = COALESCE(?3, phone), organization = COALESCE(?4, organization), email_verified = COALESCE(?5, email_verified), is_admin = COALESCE(?6, is_admin), is_active = COALESCE(?7, is_active), updated_at = ?8 WHERE id = ?9",
    )
    .bind(data.full_name)
    .bind(data.email.map(|e| e.to_lowercase()))
    .bind(data.phone)
    .bind(data.organization)
    .bind(data.email_verified)
    .bind(data.is_admin)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Toggle the admin flag. Admins cannot change their own status.
pub async fn set_admin(
    pool: &SqlitePool,
    acting_admin_id: i64,
    target_id: i64,
    is_admin: bool,
) -> RepoResult<()> {
    if acting_admin_id == target_id {
        return Err(RepoError::Validation(
            "Cannot change own admin status".into(),
        ));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET is_admin = ?, updated_at = ? WHERE id = ?")
        .bind(is_admin)
        .bind(now)
        .bind(target_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {target_id} not found")));
    }
    Ok(())
}

/// Soft delete a customer account. Self-deactivation and admin accounts are
/// rejected; order history stays attached to the deactivated row.
pub async fn deactivate(pool: &SqlitePool, acting_admin_id: i64, target_id: i64) -> RepoResult<()> {
    if acting_admin_id == target_id {
        return Err(RepoError::Validation("Cannot deactivate yourself".into()));
    }
    let target = find_by_id(pool, target_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {target_id} not found")))?;
    if target.is_admin {
        return Err(RepoError::Validation(
            "Cannot deactivate admin accounts".into(),
        ));
    }
    let now = shared::util::now_millis();
    sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(target_id)
        .execute(pool)
        .await?;
    Ok(())
}
