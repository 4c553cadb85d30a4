//! Notification Log Model

use serde::{Deserialize, Serialize};

/// One delivery attempt (email or SMS), success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct NotificationLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub order_id: Option<i64>,
    pub notification_type: String,
    pub channel: String,
    pub recipient: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: i64,
}
