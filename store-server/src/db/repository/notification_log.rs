//! Notification Log Repository

use super::RepoResult;
use shared::models::NotificationLog;
use sqlx::SqlitePool;

/// Record one delivery attempt. Never fails the caller's flow — the
/// dispatcher downgrades errors to warnings.
pub async fn append(
    pool: &SqlitePool,
    user_id: Option<i64>,
    order_id: Option<i64>,
    notification_type: &str,
    channel: &str,
    recipient: &str,
    status: &str,
    error_message: Option<&str>,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO notification_log (id, user_id, order_id, notification_type, channel, recipient, status, error_message, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(id)
    .bind(user_id)
    .bind(order_id)
    .bind(notification_type)
    .bind(channel)
    .bind(recipient)
    .bind(status)
    .bind(error_message)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Latest attempts, bounded (admin view).
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<NotificationLog>> {
    let rows = sqlx::query_as::<_, NotificationLog>(
        "SELECT id, user_id, order_id, notification_type, channel, recipient, status, error_message, created_at FROM notification_log ORDER BY created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
