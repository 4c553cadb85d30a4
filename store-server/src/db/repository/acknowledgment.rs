//! Compliance Acknowledgment Repository

use super::RepoResult;
use shared::models::Acknowledgment;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    acknowledgment_type: &str,
    ip_address: Option<&str>,
    version_hash: &str,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO acknowledgments (id, user_id, acknowledgment_type, ip_address, version_hash, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(user_id)
    .bind(acknowledgment_type)
    .bind(ip_address)
    .bind(version_hash)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Acknowledgment>> {
    let rows = sqlx::query_as::<_, Acknowledgment>(
        "SELECT id, user_id, acknowledgment_type, ip_address, version_hash, created_at FROM acknowledgments WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
