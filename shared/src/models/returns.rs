//! Return Request Models

use crate::types::{ResolutionType, ReturnStatus};
use serde::{Deserialize, Serialize};

/// A customer return request against one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReturnRequest {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub detail: Option<String>,
    pub status: ReturnStatus,
    pub resolution_type: Option<ResolutionType>,
    pub resolution_amount: Option<f64>,
    pub admin_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A returned line: subset of the order's items, by quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReturnItem {
    pub id: i64,
    pub return_id: i64,
    pub order_item_id: i64,
    pub quantity: i64,
}
