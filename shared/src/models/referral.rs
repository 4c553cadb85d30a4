//! Referral Credit Ledger Model

use crate::types::LedgerEntryType;
use serde::{Deserialize, Serialize};

/// Append-only ledger row. The signed sum of a user's rows must equal
/// `users.referral_credit` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReferralTransaction {
    pub id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub entry_type: LedgerEntryType,
    /// Signed: positive for earned/credit, negative for used.
    pub amount: f64,
    pub description: Option<String>,
    pub created_at: i64,
}
