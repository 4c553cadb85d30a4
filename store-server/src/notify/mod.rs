//! Notification Module
//!
//! Best-effort email/SMS delivery. The `Notifier` trait is the seam the
//! settlement engine and admin operations call through; the concrete
//! dispatcher talks to Resend-compatible email and Twilio-compatible SMS
//! APIs, or logs in mock mode when unconfigured. Failures are logged and
//! recorded in `notification_log`, never propagated into order flow.

mod dispatcher;

pub use dispatcher::NotificationDispatcher;

use async_trait::async_trait;
use shared::types::OrderStatus;

/// Outbound notification contract consumed by the core.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirmation email (+ SMS when a phone number is on file) after
    /// settlement.
    async fn send_order_confirmation(&self, order_id: i64) -> anyhow::Result<()>;

    /// Customer-facing status change message.
    async fn send_status_update(&self, order_id: i64, new_status: OrderStatus)
    -> anyhow::Result<()>;

    /// Scan for low-stock products and alert the admin address.
    async fn send_low_stock_alert(&self) -> anyhow::Result<()>;
}
