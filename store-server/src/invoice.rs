//! Invoice Rendering
//!
//! Plain-text invoice built from the frozen order snapshot. Purely a
//! presentation transform — no money field is ever recomputed here, only
//! formatted.

use shared::models::{Order, OrderItemDetail, User};

const LINE_WIDTH: usize = 72;

/// Minimal line-oriented document builder.
struct DocBuilder {
    out: String,
}

impl DocBuilder {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn line(&mut self, s: &str) -> &mut Self {
        self.out.push_str(s);
        self.out.push('\n');
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    fn sep(&mut self) -> &mut Self {
        self.line(&"-".repeat(LINE_WIDTH))
    }

    fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(LINE_WIDTH))
    }

    /// Left text, right text, padded apart to the full line width.
    fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let used = left.len() + right.len();
        let padding = LINE_WIDTH.saturating_sub(used).max(1);
        self.line(&format!("{left}{}{right}", " ".repeat(padding)))
    }

    fn build(self) -> Vec<u8> {
        self.out.into_bytes()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max.saturating_sub(1)).collect::<String>())
    }
}

/// Render the invoice document for a settled order.
pub fn render_invoice(order: &Order, items: &[OrderItemDetail], customer: &User) -> Vec<u8> {
    let mut doc = DocBuilder::new();

    let date = chrono::DateTime::from_timestamp_millis(order.created_at)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    doc.sep_double();
    doc.line_lr("INVOICE", &order.order_number);
    doc.sep_double();
    doc.line_lr(&format!("Date: {date}"), &format!("Status: {}", order.status.as_str()));
    doc.blank();

    doc.line("Bill to:");
    doc.line(&format!("  {}", customer.full_name));
    if let Some(org) = customer.organization.as_deref()
        && !org.is_empty()
    {
        doc.line(&format!("  {org}"));
    }
    doc.line(&format!("  {}", customer.email));
    if let Some(address) = order.shipping_address.as_deref()
        && !address.is_empty()
    {
        doc.line(&format!("  {address}"));
    }
    doc.blank();

    doc.sep();
    // SKU(10) | item(34) | qty(5) | unit(10) | amount(11)
    doc.line(&format!(
        "{:<10} {:<34} {:>4} {:>9} {:>11}",
        "SKU", "Item", "Qty", "Unit", "Amount"
    ));
    doc.sep();
    for item in items {
        let amount = item.unit_price * item.quantity as f64;
        doc.line(&format!(
            "{:<10} {:<34} {:>4} {:>9.2} {:>11.2}",
            truncate(&item.sku, 10),
            truncate(&item.name, 34),
            item.quantity,
            item.unit_price,
            amount
        ));
    }
    doc.sep();

    doc.line_lr("Subtotal", &format!("{:.2}", order.subtotal));
    if order.discount_amount > 0.0 {
        doc.line_lr("Discount", &format!("-{:.2}", order.discount_amount));
    }
    if order.shipping_cost > 0.0 {
        doc.line_lr("Shipping", &format!("{:.2}", order.shipping_cost));
    }
    if order.credit_applied > 0.0 {
        doc.line_lr("Store credit", &format!("-{:.2}", order.credit_applied));
    }
    doc.sep();
    doc.line_lr("TOTAL", &format!("{:.2}", order.total));
    doc.sep_double();
    doc.blank();
    doc.line("For research use only. Not for human or animal consumption.");

    doc.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{DeliveryMethod, OrderStatus, PriceBasis};

    fn fixture() -> (Order, Vec<OrderItemDetail>, User) {
        let order = Order {
            id: 1,
            user_id: 2,
            order_number: "RO-20250101120000-AB12CD".into(),
            subtotal: 578.0,
            discount_amount: 57.8,
            discount_code_id: Some(9),
            shipping_cost: 25.0,
            credit_applied: 15.0,
            total: 530.2,
            status: OrderStatus::PendingPayment,
            delivery_method: DeliveryMethod::Ship,
            notes: None,
            admin_notes: None,
            shipping_address: Some("1 Research Way, Lab City".into()),
            tracking_number: None,
            created_at: 1_735_732_800_000,
            updated_at: 1_735_732_800_000,
        };
        let items = vec![OrderItemDetail {
            id: 10,
            order_id: 1,
            product_id: 3,
            quantity: 10,
            unit_price: 57.8,
            price_basis: PriceBasis::Bulk,
            name: "SS-31 (10mg/10vials)".into(),
            sku: "2S10".into(),
        }];
        let customer = User {
            id: 2,
            full_name: "Alice Researcher".into(),
            email: "alice@example.com".into(),
            phone: "555-0100".into(),
            organization: Some("Example Labs".into()),
            country: "US".into(),
            is_admin: false,
            email_verified: true,
            referral_credit: 0.0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        (order, items, customer)
    }

    #[test]
    fn test_invoice_contains_snapshot_fields() {
        let (order, items, customer) = fixture();
        let doc = String::from_utf8(render_invoice(&order, &items, &customer)).unwrap();
        assert!(doc.contains("RO-20250101120000-AB12CD"));
        assert!(doc.contains("Alice Researcher"));
        assert!(doc.contains("2S10"));
        assert!(doc.contains("57.80"));
        assert!(doc.contains("578.00"));
        assert!(doc.contains("-57.80"));
        assert!(doc.contains("530.20"));
        assert!(doc.contains("Store credit"));
    }

    #[test]
    fn test_invoice_omits_zero_lines() {
        let (mut order, items, customer) = fixture();
        order.discount_amount = 0.0;
        order.credit_applied = 0.0;
        let doc = String::from_utf8(render_invoice(&order, &items, &customer)).unwrap();
        assert!(!doc.contains("Discount"));
        assert!(!doc.contains("Store credit"));
    }

    #[test]
    fn test_long_names_truncated_to_column() {
        let (order, mut items, customer) = fixture();
        items[0].name = "A".repeat(80);
        let doc = String::from_utf8(render_invoice(&order, &items, &customer)).unwrap();
        // Item column capped; the row still renders
        assert!(doc.lines().any(|l| l.contains('…')));
    }
}
