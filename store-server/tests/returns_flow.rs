//! Return request lifecycle tests: eligibility, resolutions, and the
//! no-reprocessing rule.

mod common;

use common::*;
use shared::types::{LedgerEntryType, OrderStatus, ResolutionType, ReturnStatus};
use store_server::credit;
use store_server::db::repository::{order, referral};
use store_server::orders::update_order_status;
use store_server::returns::{OpenReturnRequest, ProcessReturnRequest, ReturnLineInput, ReturnsResolver};
use store_server::{AppError, DbService};

async fn settled_delivered_order(db: &DbService, email: &str) -> (i64, i64, i64) {
    let buyer = seed_user(db, email).await;
    let p = seed_product(db, "RET1", 50.0, 10).await;
    let outcome = engine(db)
        .place_order(checkout(buyer.id, vec![line(p.id, 2)]))
        .await
        .unwrap();
    update_order_status(&db.pool, None, outcome.order.id, OrderStatus::Delivered, None, None)
        .await
        .unwrap();
    let items = order::find_items(&db.pool, outcome.order.id).await.unwrap();
    (buyer.id, outcome.order.id, items[0].id)
}

fn resolver(db: &DbService) -> ReturnsResolver {
    ReturnsResolver::new(db.pool.clone(), test_config())
}

fn open_request(user_id: i64, order_id: i64, item_id: i64, qty: i64) -> OpenReturnRequest {
    OpenReturnRequest {
        order_id,
        user_id,
        reason: "damaged in transit".into(),
        detail: None,
        items: vec![ReturnLineInput {
            order_item_id: item_id,
            quantity: qty,
        }],
    }
}

#[tokio::test]
async fn open_and_resolve_as_store_credit() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);

    let ret = resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();
    assert_eq!(ret.status, ReturnStatus::Pending);

    let processed = resolver
        .process_return(ProcessReturnRequest {
            return_id: ret.id,
            resolution_type: ResolutionType::StoreCredit,
            resolution_amount: Some(50.0),
            admin_notes: Some("credited in full".into()),
        })
        .await
        .unwrap();
    assert_eq!(processed.status, ReturnStatus::Approved);
    assert_eq!(processed.resolution_amount, Some(50.0));

    // Ledger credited and consistent with the cached balance
    assert_eq!(credit::balance(&db.pool, uid).await.unwrap(), 50.0);
    let ledger = referral::list_by_user(&db.pool, uid).await.unwrap();
    assert_eq!(ledger[0].entry_type, LedgerEntryType::Credit);
    let rec = credit::reconcile(&db.pool, uid).await.unwrap();
    assert!(rec.consistent);
}

#[tokio::test]
async fn return_cannot_be_processed_twice() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);
    let ret = resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();

    resolver
        .process_return(ProcessReturnRequest {
            return_id: ret.id,
            resolution_type: ResolutionType::Denied,
            resolution_amount: None,
            admin_notes: None,
        })
        .await
        .unwrap();

    let err = resolver
        .process_return(ProcessReturnRequest {
            return_id: ret.id,
            resolution_type: ResolutionType::StoreCredit,
            resolution_amount: Some(10.0),
            admin_notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Denial moved no money
    assert_eq!(credit::balance(&db.pool, uid).await.unwrap(), 0.0);
}

#[tokio::test]
async fn only_one_open_return_per_order() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);

    resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();
    let err = resolver
        .open_return(open_request(uid, oid, item_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn denied_return_does_not_block_a_new_one() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);

    let first = resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();
    resolver
        .process_return(ProcessReturnRequest {
            return_id: first.id,
            resolution_type: ResolutionType::Denied,
            resolution_amount: None,
            admin_notes: None,
        })
        .await
        .unwrap();

    // A denied return leaves the order open for another request
    resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();
}

#[tokio::test]
async fn full_refund_parks_until_completed() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);
    let ret = resolver.open_return(open_request(uid, oid, item_id, 2)).await.unwrap();

    let processed = resolver
        .process_return(ProcessReturnRequest {
            return_id: ret.id,
            resolution_type: ResolutionType::FullRefund,
            resolution_amount: Some(100.0),
            admin_notes: None,
        })
        .await
        .unwrap();
    assert_eq!(processed.status, ReturnStatus::RefundPending);

    let completed = resolver.complete_refund(ret.id).await.unwrap();
    assert_eq!(completed.status, ReturnStatus::Refunded);

    // Completing twice is a state error
    let err = resolver.complete_refund(ret.id).await.unwrap_err();
    assert!(matches!(err, AppError::State(_)));
}

#[tokio::test]
async fn complete_refund_requires_refund_pending() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);
    let ret = resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();

    let err = resolver.complete_refund(ret.id).await.unwrap_err();
    assert!(matches!(err, AppError::State(_)));
}

#[tokio::test]
async fn replacement_parks_for_manual_handling() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let resolver = resolver(&db);
    let ret = resolver.open_return(open_request(uid, oid, item_id, 1)).await.unwrap();

    let processed = resolver
        .process_return(ProcessReturnRequest {
            return_id: ret.id,
            resolution_type: ResolutionType::Replacement,
            resolution_amount: None,
            admin_notes: None,
        })
        .await
        .unwrap();
    assert_eq!(processed.status, ReturnStatus::ReplacementPending);
}

#[tokio::test]
async fn returns_require_a_fulfilled_status() {
    let (db, _dir) = test_db().await;
    let buyer = seed_user(&db, "alice@example.com").await;
    let p = seed_product(&db, "P1", 50.0, 10).await;
    let outcome = engine(&db)
        .place_order(checkout(buyer.id, vec![line(p.id, 1)]))
        .await
        .unwrap();
    let items = order::find_items(&db.pool, outcome.order.id).await.unwrap();

    // Still pending_payment: not returnable
    let err = resolver(&db)
        .open_return(open_request(buyer.id, outcome.order.id, items[0].id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::State(_)));
}

#[tokio::test]
async fn return_window_closes_after_configured_days() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;

    // Age the order past the 90-day window
    let old = shared::util::now_millis() - 91 * 24 * 60 * 60 * 1000;
    sqlx::query("UPDATE orders SET created_at = ? WHERE id = ?")
        .bind(old)
        .bind(oid)
        .execute(&db.pool)
        .await
        .unwrap();

    let err = resolver(&db)
        .open_return(open_request(uid, oid, item_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::State(_)));
}

#[tokio::test]
async fn cannot_return_more_than_ordered() {
    let (db, _dir) = test_db().await;
    let (uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;

    let err = resolver(&db)
        .open_return(open_request(uid, oid, item_id, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn cannot_return_someone_elses_order() {
    let (db, _dir) = test_db().await;
    let (_uid, oid, item_id) = settled_delivered_order(&db, "alice@example.com").await;
    let stranger = seed_user(&db, "mallory@example.com").await;

    let err = resolver(&db)
        .open_return(open_request(stranger.id, oid, item_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
