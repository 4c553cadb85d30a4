//! Status and enumeration types stored as TEXT columns.
//!
//! All enums round-trip through snake_case strings, matching the values the
//! storage layer persists.

use serde::{Deserialize, Serialize};

/// Fulfillment lifecycle of an order.
///
/// The settlement engine only ever creates orders as `PendingPayment`; later
/// transitions belong to the admin surface. Any status may follow any other —
/// the set membership itself is the only transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Fulfilled,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "paid" => Some(OrderStatus::Paid),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "fulfilled" => Some(OrderStatus::Fulfilled),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Statuses from which a customer may open a return.
    pub fn is_returnable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Fulfilled
        )
    }
}

/// How the order leaves the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DeliveryMethod {
    Pickup,
    Ship,
}

/// Which pricing rule produced a line's unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PriceBasis {
    Sale,
    Bulk,
    Single,
}

/// Ledger entry kinds for `referral_transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LedgerEntryType {
    /// Commission from a referral redemption (positive).
    Earned,
    /// Credit applied against an order total (negative).
    Used,
    /// Manual admin correction (either sign).
    Adjustment,
    /// Credit granted outside referrals, e.g. a return resolution (positive).
    Credit,
}

/// Return request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ReturnStatus {
    Pending,
    Approved,
    Denied,
    RefundPending,
    Refunded,
    ReplacementPending,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Denied => "denied",
            ReturnStatus::RefundPending => "refund_pending",
            ReturnStatus::Refunded => "refunded",
            ReturnStatus::ReplacementPending => "replacement_pending",
        }
    }

    /// A return that has left `pending` can never be processed again.
    pub fn is_processed(&self) -> bool {
        !matches!(self, ReturnStatus::Pending)
    }

    /// Counts against the one-open-return-per-order rule.
    pub fn blocks_new_return(&self) -> bool {
        !matches!(self, ReturnStatus::Denied)
    }
}

/// Admin decision on a pending return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ResolutionType {
    Denied,
    StoreCredit,
    PartialCredit,
    FullRefund,
    Replacement,
}

/// How a customer using their own referral code wants the benefit split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferrerChoice {
    /// One combined discount (`discount_percent + commission_percent`), no credit.
    Combined,
    /// Normal discount now, commission credited to the ledger.
    Split,
}
