//! Admin-side tests: status transitions with notification gating, money
//! edits with audit lines, and reporting queries.

mod common;

use async_trait::async_trait;
use common::*;
use shared::models::DiscountCodeCreate;
use shared::types::OrderStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use store_server::db::repository::discount_code;
use store_server::marketing::preview_code;
use store_server::notify::Notifier;
use store_server::orders::{OrderMoneyEdit, edit_order_money, reapply_discount, update_order_status};
use store_server::{AppError, reporting};

/// Counts status-update dispatches instead of sending anything.
#[derive(Default)]
struct RecordingNotifier {
    status_updates: AtomicUsize,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_order_confirmation(&self, _order_id: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_status_update(
        &self,
        _order_id: i64,
        _new_status: OrderStatus,
    ) -> anyhow::Result<()> {
        self.status_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_low_stock_alert(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn status_change_notifies_once_and_noop_does_not() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let outcome = engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 1)]))
        .await
        .unwrap();

    let recorder = Arc::new(RecordingNotifier::default());
    let notifier: Arc<dyn Notifier> = recorder.clone();

    let updated = update_order_status(
        &db.pool,
        Some(&notifier),
        outcome.order.id,
        OrderStatus::Paid,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);

    // Same -> same: persisted (notes may change) but no second notification
    update_order_status(
        &db.pool,
        Some(&notifier),
        outcome.order.id,
        OrderStatus::Paid,
        Some("double-checked payment"),
        None,
    )
    .await
    .unwrap();

    // Let the spawned dispatch settle
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(recorder.status_updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn money_edit_recomputes_total_and_audits() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let outcome = engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 2)]))
        .await
        .unwrap();
    assert_eq!(outcome.order.total, 100.0);

    let edited = edit_order_money(
        &db.pool,
        999,
        outcome.order.id,
        OrderMoneyEdit {
            discount_amount: Some(20.0),
            shipping_cost: Some(10.0),
        },
    )
    .await
    .unwrap();

    assert_eq!(edited.discount_amount, 20.0);
    assert_eq!(edited.shipping_cost, 10.0);
    assert_eq!(edited.total, 90.0);
    let notes = edited.admin_notes.unwrap();
    assert!(notes.contains("admin 999"));
    assert!(notes.contains("100.00 -> 90.00"));

    // A second edit appends rather than overwriting the audit trail
    let edited = edit_order_money(
        &db.pool,
        999,
        outcome.order.id,
        OrderMoneyEdit {
            discount_amount: Some(0.0),
            shipping_cost: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.total, 110.0);
    assert_eq!(edited.admin_notes.unwrap().lines().count(), 2);
}

#[tokio::test]
async fn money_edit_clamps_total_at_zero() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let outcome = engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 1)]))
        .await
        .unwrap();

    let edited = edit_order_money(
        &db.pool,
        999,
        outcome.order.id,
        OrderMoneyEdit {
            discount_amount: Some(80.0),
            shipping_cost: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.total, 0.0);
}

#[tokio::test]
async fn reapply_discount_uses_frozen_lines() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let code = discount_code::create(
        &db.pool,
        DiscountCodeCreate {
            code: "SAVE10".into(),
            description: None,
            discount_percent: Some(10.0),
            discount_amount: None,
            min_order_amount: None,
            usage_limit: None,
            referrer_user_id: None,
            commission_percent: None,
            expires_at: None,
        },
    )
    .await
    .unwrap();

    let mut request = checkout(buyer.id, vec![line(p.id, 2)]);
    request.discount_code = Some("SAVE10".into());
    let outcome = engine(&db).place_order(request).await.unwrap();
    assert_eq!(outcome.order.discount_amount, 10.0);

    // Admin bumps the code to 25% and re-applies it to the frozen subtotal
    discount_code::update(
        &db.pool,
        code.id,
        shared::models::DiscountCodeUpdate {
            discount_percent: Some(25.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let edited = reapply_discount(&db.pool, 999, outcome.order.id).await.unwrap();
    assert_eq!(edited.discount_amount, 25.0);
    assert_eq!(edited.total, 75.0);
}

#[tokio::test]
async fn reapply_without_code_is_rejected() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let outcome = engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 1)]))
        .await
        .unwrap();

    let err = reapply_discount(&db.pool, 999, outcome.order.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn dashboard_stats_aggregate() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 5).await;
    engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 2)]))
        .await
        .unwrap();

    let stats = reporting::dashboard_stats(&db.pool, 10).await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, 100.0);
    assert_eq!(stats.orders_by_status.get("pending_payment"), Some(&1));
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.recent_orders.len(), 1);
    // 3 left in stock, threshold 10 -> flagged
    assert_eq!(stats.low_stock_items.len(), 1);
}

#[tokio::test]
async fn reorder_suggestions_in_boxes_of_ten() {
    let (db, _dir) = test_db().await;
    seed_product(&db, "LOW", 50.0, 2).await; // reorder_qty = 1 from the fixture

    let suggestions = reporting::reorder_suggestions(&db.pool, 10).await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].reorder_boxes, 1);
    assert_eq!(suggestions[0].reorder_units, 10);
}

#[tokio::test]
async fn preview_does_not_consume_usage() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "buyer@example.com").await;
    discount_code::create(
        &db.pool,
        DiscountCodeCreate {
            code: "SAVE10".into(),
            description: None,
            discount_percent: Some(10.0),
            discount_amount: None,
            min_order_amount: Some(50.0),
            usage_limit: Some(1),
            referrer_user_id: None,
            commission_percent: None,
            expires_at: None,
        },
    )
    .await
    .unwrap();

    let preview = preview_code(&db.pool, "save10", 100.0, 100.0, buyer.id, None)
        .await
        .unwrap();
    assert!(preview.valid);
    assert!(preview.applicable);
    assert_eq!(preview.discount_amount, 10.0);

    let code = discount_code::find_by_code(&db.pool, "SAVE10").await.unwrap().unwrap();
    assert_eq!(code.times_used, 0);

    // Below the minimum order: specific rejection
    let err = preview_code(&db.pool, "save10", 40.0, 40.0, buyer.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
