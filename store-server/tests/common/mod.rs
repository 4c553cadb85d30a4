//! Shared fixtures for integration tests.

use shared::models::{Product, ProductCreate, User, UserCreate};
use shared::types::DeliveryMethod;
use std::sync::Arc;
use store_server::db::DbService;
use store_server::db::repository::{product, user};
use store_server::orders::{CartLine, CheckoutRequest};
use store_server::{Config, SettlementEngine};
use tempfile::TempDir;

pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        database_path: String::new(),
        app_url: "http://localhost".into(),
        admin_email: String::new(),
        email_from: "orders@example.com".into(),
        resend_api_key: String::new(),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_phone_number: String::new(),
        low_stock_threshold: 10,
        shipping_fee: 25.0,
        return_window_days: 90,
        environment: "development".into(),
    })
}

/// File-backed database in a temp dir so multiple pool connections see the
/// same data (needed for concurrency tests).
pub async fn test_db() -> (DbService, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.db");
    let db = DbService::new(path.to_str().unwrap()).await.expect("db");
    (db, dir)
}

pub async fn seed_user(db: &DbService, email: &str) -> User {
    user::create(
        &db.pool,
        UserCreate {
            full_name: "Test User".into(),
            email: email.into(),
            phone: "555-0100".into(),
            organization: None,
            country: "US".into(),
        },
    )
    .await
    .expect("seed user")
}

pub async fn seed_product(db: &DbService, sku: &str, price_single: f64, stock: i64) -> Product {
    product::create(
        &db.pool,
        ProductCreate {
            sku: sku.into(),
            name: format!("Product {sku}"),
            description: None,
            category: Some("Peptides".into()),
            unit_cost: None,
            price_single,
            price_bulk: None,
            bulk_quantity: None,
            sale_price: None,
            sale_start: None,
            sale_end: None,
            sale_min_qty: None,
            stock: Some(stock),
            reorder_qty: Some(1),
            sort_order: None,
        },
    )
    .await
    .expect("seed product")
}

pub fn engine(db: &DbService) -> SettlementEngine {
    SettlementEngine::new(db.pool.clone(), test_config())
}

pub fn checkout(user_id: i64, items: Vec<CartLine>) -> CheckoutRequest {
    CheckoutRequest {
        user_id,
        items,
        discount_code: None,
        referrer_choice: None,
        delivery_method: DeliveryMethod::Pickup,
        shipping_address: None,
        notes: None,
        apply_credit: false,
        final_attestation: true,
        ip_address: Some("127.0.0.1".into()),
    }
}

pub fn line(product_id: i64, quantity: i64) -> CartLine {
    CartLine {
        product_id,
        quantity,
    }
}
