//! User Model

use serde::{Deserialize, Serialize};

/// Customer / admin account.
///
/// `referral_credit` is a cached running balance, denormalized from the
/// `referral_transactions` ledger — always written in the same transaction as
/// the ledger row it reflects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub country: String,
    pub is_admin: bool,
    pub email_verified: bool,
    pub referral_credit: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub country: String,
}

/// Admin update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub email_verified: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}
