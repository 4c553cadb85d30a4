//! Notification Dispatcher
//!
//! Concrete `Notifier` backed by HTTP providers. Every attempt — sent or
//! failed, real or mock — lands in `notification_log` so the admin console
//! can audit deliveries.

use super::Notifier;
use crate::core::Config;
use crate::db::repository::{notification_log, order, product, user};
use async_trait::async_trait;
use shared::models::{Order, OrderItemDetail, Product, User};
use shared::types::OrderStatus;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct NotificationDispatcher {
    pool: SqlitePool,
    config: Arc<Config>,
    http: reqwest::Client,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, config: Arc<Config>) -> Self {
        Self {
            pool,
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Send an email through the provider, or log it in mock mode.
    /// Returns the provider response body on success.
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<String> {
        if !self.config.email_enabled() {
            tracing::info!(to, subject, "Email mock mode, not sent");
            return Ok("mock".into());
        }

        let response = self
            .http
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.config.resend_api_key)
            .json(&serde_json::json!({
                "from": self.config.email_from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Email provider returned {status}: {body}");
        }
        tracing::info!(to, subject, "Email sent");
        Ok(body)
    }

    /// Send an SMS through the provider, or log it in mock mode.
    async fn send_sms(&self, to: &str, body: &str) -> anyhow::Result<String> {
        if !self.config.sms_enabled() {
            tracing::info!(to, "SMS mock mode, not sent");
            return Ok("mock".into());
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.twilio_account_sid
        );
        let response = self
            .http
            .post(&url)
            .basic_auth(
                &self.config.twilio_account_sid,
                Some(&self.config.twilio_auth_token),
            )
            .form(&[
                ("To", to),
                ("From", self.config.twilio_phone_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("SMS provider returned {status}: {text}");
        }
        tracing::info!(to, "SMS sent");
        Ok(text)
    }

    /// Record one delivery attempt. Log failures are themselves downgraded
    /// to warnings — the log must never break a dispatch.
    async fn log_attempt(
        &self,
        user_id: Option<i64>,
        order_id: Option<i64>,
        notification_type: &str,
        channel: &str,
        recipient: &str,
        result: &anyhow::Result<String>,
    ) {
        let (status, error) = match result {
            Ok(_) => ("sent", None),
            Err(e) => ("failed", Some(e.to_string())),
        };
        if let Err(e) = notification_log::append(
            &self.pool,
            user_id,
            order_id,
            notification_type,
            channel,
            recipient,
            status,
            error.as_deref(),
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to record notification attempt");
        }
    }

    async fn load_order_context(
        &self,
        order_id: i64,
    ) -> anyhow::Result<(Order, User, Vec<OrderItemDetail>)> {
        let order = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order {order_id} not found"))?;
        let customer = user::find_by_id(&self.pool, order.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", order.user_id))?;
        let items = order::find_items(&self.pool, order_id).await?;
        Ok((order, customer, items))
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn send_order_confirmation(&self, order_id: i64) -> anyhow::Result<()> {
        let (order, customer, items) = self.load_order_context(order_id).await?;

        let html = confirmation_html(&order, &customer, &items);
        let subject = format!("Order Confirmation - {}", order.order_number);
        let result = self.send_email(&customer.email, &subject, &html).await;
        if let Err(e) = &result {
            tracing::warn!(order_id, error = %e, "Confirmation email failed");
        }
        self.log_attempt(
            Some(customer.id),
            Some(order_id),
            "order_confirmation",
            "email",
            &customer.email,
            &result,
        )
        .await;

        if !customer.phone.is_empty() {
            let sms = format!(
                "Order {} confirmed. Total: {:.2}",
                order.order_number, order.total
            );
            let result = self.send_sms(&customer.phone, &sms).await;
            if let Err(e) = &result {
                tracing::warn!(order_id, error = %e, "Confirmation SMS failed");
            }
            self.log_attempt(
                Some(customer.id),
                Some(order_id),
                "order_confirmation",
                "sms",
                &customer.phone,
                &result,
            )
            .await;
        }

        Ok(())
    }

    async fn send_status_update(
        &self,
        order_id: i64,
        new_status: OrderStatus,
    ) -> anyhow::Result<()> {
        let (order, customer, _) = self.load_order_context(order_id).await?;

        let message = status_message(&order, new_status);
        let html = format!(
            "<html><body><h2>Order Update</h2><p>Hi {},</p>\
             <p>Order <strong>{}</strong>: {}</p></body></html>",
            customer.full_name, order.order_number, message
        );
        let subject = format!("Order Update - {}", order.order_number);
        let result = self.send_email(&customer.email, &subject, &html).await;
        if let Err(e) = &result {
            tracing::warn!(order_id, error = %e, "Status email failed");
        }
        self.log_attempt(
            Some(customer.id),
            Some(order_id),
            "status_update",
            "email",
            &customer.email,
            &result,
        )
        .await;

        if !customer.phone.is_empty() {
            let sms = format!("Order {}: {}", order.order_number, message);
            let result = self.send_sms(&customer.phone, &sms).await;
            if let Err(e) = &result {
                tracing::warn!(order_id, error = %e, "Status SMS failed");
            }
            self.log_attempt(
                Some(customer.id),
                Some(order_id),
                "status_update",
                "sms",
                &customer.phone,
                &result,
            )
            .await;
        }

        Ok(())
    }

    async fn send_low_stock_alert(&self) -> anyhow::Result<()> {
        let low_stock =
            product::find_low_stock(&self.pool, self.config.low_stock_threshold).await?;
        if low_stock.is_empty() || self.config.admin_email.is_empty() {
            return Ok(());
        }

        let html = low_stock_html(&low_stock);
        let result = self
            .send_email(&self.config.admin_email, "Low Stock Alert", &html)
            .await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Low stock alert email failed");
        }
        self.log_attempt(
            None,
            None,
            "low_stock_alert",
            "email",
            &self.config.admin_email,
            &result,
        )
        .await;

        Ok(())
    }
}

fn confirmation_html(order: &Order, customer: &User, items: &[OrderItemDetail]) -> String {
    let rows: String = items
        .iter()
        .map(|i| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>",
                i.name,
                i.quantity,
                i.unit_price,
                i.unit_price * i.quantity as f64
            )
        })
        .collect();

    let mut totals = format!("<p><strong>Subtotal:</strong> {:.2}</p>", order.subtotal);
    if order.discount_amount > 0.0 {
        totals.push_str(&format!(
            "<p><strong>Discount:</strong> -{:.2}</p>",
            order.discount_amount
        ));
    }
    if order.shipping_cost > 0.0 {
        totals.push_str(&format!(
            "<p><strong>Shipping:</strong> {:.2}</p>",
            order.shipping_cost
        ));
    }
    if order.credit_applied > 0.0 {
        totals.push_str(&format!(
            "<p><strong>Store credit:</strong> -{:.2}</p>",
            order.credit_applied
        ));
    }
    totals.push_str(&format!("<p><strong>Total:</strong> {:.2}</p>", order.total));

    format!(
        "<html><body><h2>Order Confirmation</h2>\
         <p>Hi {},</p>\
         <p>Your order <strong>{}</strong> has been received.</p>\
         <table><tr><th>Item</th><th>Qty</th><th>Price</th><th>Total</th></tr>{rows}</table>\
         {totals}\
         <p>For research use only. Not for human or animal consumption.</p>\
         </body></html>",
        customer.full_name, order.order_number
    )
}

fn status_message(order: &Order, new_status: OrderStatus) -> String {
    match new_status {
        OrderStatus::Paid => "Your payment has been received.".into(),
        OrderStatus::Processing => "Your order is being prepared.".into(),
        OrderStatus::Shipped => match &order.tracking_number {
            Some(t) if !t.is_empty() => format!("Your order has been shipped. Tracking: {t}"),
            _ => "Your order has been shipped.".into(),
        },
        OrderStatus::Delivered => "Your order has been delivered.".into(),
        OrderStatus::Fulfilled => "Your order is complete.".into(),
        OrderStatus::Cancelled => "Your order has been cancelled.".into(),
        OrderStatus::Refunded => "Your order has been refunded.".into(),
        other => format!("Your order status: {}", other.as_str()),
    }
}

fn low_stock_html(products: &[Product]) -> String {
    let rows: String = products
        .iter()
        .map(|p| {
            let reorder = if p.reorder_qty > 0 {
                // reorder_qty is in boxes of 10 units
                format!(" (reorder {} boxes / {} units)", p.reorder_qty, p.reorder_qty * 10)
            } else {
                String::new()
            };
            format!(
                "<li>{} - {}: <strong>{} remaining</strong>{}</li>",
                p.sku, p.name, p.stock, reorder
            )
        })
        .collect();
    format!(
        "<html><body><h2>Low Stock Alert</h2>\
         <p>The following products are running low:</p><ul>{rows}</ul></body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{DeliveryMethod, PriceBasis};

    fn make_order() -> Order {
        Order {
            id: 1,
            user_id: 2,
            order_number: "RO-20250101120000-ABC123".into(),
            subtotal: 100.0,
            discount_amount: 10.0,
            discount_code_id: None,
            shipping_cost: 25.0,
            credit_applied: 15.0,
            total: 100.0,
            status: OrderStatus::PendingPayment,
            delivery_method: DeliveryMethod::Ship,
            notes: None,
            admin_notes: None,
            shipping_address: None,
            tracking_number: Some("1Z999".into()),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_confirmation_html_includes_all_money_lines() {
        let customer = User {
            id: 2,
            full_name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: "555".into(),
            organization: None,
            country: "US".into(),
            is_admin: false,
            email_verified: true,
            referral_credit: 0.0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let items = vec![OrderItemDetail {
            id: 1,
            order_id: 1,
            product_id: 3,
            quantity: 2,
            unit_price: 50.0,
            price_basis: PriceBasis::Single,
            name: "Widget".into(),
            sku: "W1".into(),
        }];
        let html = confirmation_html(&make_order(), &customer, &items);
        assert!(html.contains("RO-20250101120000-ABC123"));
        assert!(html.contains("Discount"));
        assert!(html.contains("Shipping"));
        assert!(html.contains("Store credit"));
        assert!(html.contains("Widget"));
    }

    #[test]
    fn test_shipped_message_carries_tracking() {
        let order = make_order();
        let msg = status_message(&order, OrderStatus::Shipped);
        assert!(msg.contains("1Z999"));
    }

    #[test]
    fn test_low_stock_html_reorder_boxes() {
        let product = Product {
            id: 1,
            sku: "2S10".into(),
            name: "Test".into(),
            description: None,
            category: None,
            unit_cost: 0.0,
            price_single: 10.0,
            price_bulk: None,
            bulk_quantity: 10,
            sale_price: None,
            sale_start: None,
            sale_end: None,
            sale_min_qty: 1,
            stock: 3,
            reorder_qty: 2,
            sort_order: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let html = low_stock_html(&[product]);
        assert!(html.contains("3 remaining"));
        assert!(html.contains("2 boxes / 20 units"));
    }
}
