//! Discount / Referral Code Model

use serde::{Deserialize, Serialize};

/// A discount code, optionally tied to a referrer.
///
/// `discount_percent` and `discount_amount` are mutually exclusive in
/// practice; percent takes priority when > 0. A non-null `referrer_user_id`
/// turns the code into a referral code: the referrer earns
/// `commission_percent` of the subtotal when someone else redeems it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiscountCode {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub min_order_amount: f64,
    /// None = unlimited.
    pub usage_limit: Option<i64>,
    pub times_used: i64,
    pub referrer_user_id: Option<i64>,
    pub commission_percent: f64,
    pub is_active: bool,
    /// Millis UTC; None = never expires.
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DiscountCode {
    pub fn is_referral(&self) -> bool {
        self.referrer_user_id.is_some()
    }
}

/// Create code payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCodeCreate {
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: Option<f64>,
    pub discount_amount: Option<f64>,
    pub min_order_amount: Option<f64>,
    pub usage_limit: Option<i64>,
    pub referrer_user_id: Option<i64>,
    pub commission_percent: Option<f64>,
    pub expires_at: Option<i64>,
}

/// Update code payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountCodeUpdate {
    pub description: Option<String>,
    pub discount_percent: Option<f64>,
    pub discount_amount: Option<f64>,
    pub min_order_amount: Option<f64>,
    pub usage_limit: Option<i64>,
    pub commission_percent: Option<f64>,
    pub is_active: Option<bool>,
    pub expires_at: Option<i64>,
}
