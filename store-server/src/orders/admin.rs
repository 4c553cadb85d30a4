//! Admin Order Operations
//!
//! Status transitions and the explicit money-edit path. Status changes
//! notify the customer only when the status actually changed; money edits
//! recompute the total from the settlement formula and append an audit line
//! to `admin_notes` instead of silently overwriting history.

use crate::db::repository::{discount_code, order};
use crate::marketing::{self, DiscountOutcome};
use crate::money::{to_decimal, to_f64, validate_money};
use crate::notify::Notifier;
use crate::utils::{AppError, AppResult};
use rust_decimal::Decimal;
use shared::models::Order;
use shared::types::{OrderStatus, PriceBasis, ReferrerChoice};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Update an order's fulfillment status. A no-op (same → same) transition
/// is persisted for notes/tracking but never re-triggers the customer
/// notification.
pub async fn update_order_status(
    pool: &SqlitePool,
    notifier: Option<&Arc<dyn Notifier>>,
    order_id: i64,
    new_status: OrderStatus,
    admin_notes: Option<&str>,
    tracking_number: Option<&str>,
) -> AppResult<Order> {
    let existing = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

    order::update_status(pool, order_id, new_status, admin_notes, tracking_number).await?;

    if existing.status != new_status
        && let Some(notifier) = notifier
    {
        let notifier = Arc::clone(notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_status_update(order_id, new_status).await {
                tracing::warn!(order_id, error = %e, "Status update dispatch failed");
            }
        });
    }

    order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))
}

/// Money-field overrides for an existing order.
#[derive(Debug, Clone, Default)]
pub struct OrderMoneyEdit {
    pub discount_amount: Option<f64>,
    pub shipping_cost: Option<f64>,
}

/// Override discount and/or shipping. The total is recomputed with the
/// settlement formula (`max(0, subtotal - discount + shipping - credit)`)
/// and the change is audited in `admin_notes`.
pub async fn edit_order_money(
    pool: &SqlitePool,
    acting_admin_id: i64,
    order_id: i64,
    edit: OrderMoneyEdit,
) -> AppResult<Order> {
    if edit.discount_amount.is_none() && edit.shipping_cost.is_none() {
        return Err(AppError::validation("Nothing to edit"));
    }
    if let Some(d) = edit.discount_amount {
        validate_money(d, "discount_amount")?;
    }
    if let Some(s) = edit.shipping_cost {
        validate_money(s, "shipping_cost")?;
    }

    let existing = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

    let new_discount = edit.discount_amount.unwrap_or(existing.discount_amount);
    let new_shipping = edit.shipping_cost.unwrap_or(existing.shipping_cost);
    apply_money_edit(
        pool,
        acting_admin_id,
        &existing,
        new_discount,
        new_shipping,
        "manual override",
    )
    .await
}

/// Re-run the attached discount code against the order's frozen lines and
/// replace `discount_amount` with the result. Self-referral orders re-apply
/// at the plain (split) discount rate — the combined choice is not
/// reconstructible after settlement.
pub async fn reapply_discount(
    pool: &SqlitePool,
    acting_admin_id: i64,
    order_id: i64,
) -> AppResult<Order> {
    let existing = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
    let code_id = existing
        .discount_code_id
        .ok_or_else(|| AppError::validation("Order has no discount code attached"))?;
    let code = discount_code::find_by_id(pool, code_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Discount code {code_id} not found")))?;

    // Rebuild the eligible (non-sale) subtotal from the frozen lines
    let items = order::find_items(pool, order_id).await?;
    let eligible: Decimal = items
        .iter()
        .filter(|i| i.price_basis != PriceBasis::Sale)
        .map(|i| to_decimal(i.unit_price) * Decimal::from(i.quantity))
        .sum();

    let eval = marketing::evaluate_code(
        &code,
        to_decimal(existing.subtotal),
        eligible,
        existing.user_id,
        Some(ReferrerChoice::Split),
        shared::util::now_millis(),
    )?;
    let new_discount = match eval.outcome {
        DiscountOutcome::Applied(amount) => to_f64(amount),
        DiscountOutcome::NotApplicable => 0.0,
    };

    apply_money_edit(
        pool,
        acting_admin_id,
        &existing,
        new_discount,
        existing.shipping_cost,
        &format!("re-applied code {}", code.code),
    )
    .await
}

async fn apply_money_edit(
    pool: &SqlitePool,
    acting_admin_id: i64,
    existing: &Order,
    new_discount: f64,
    new_shipping: f64,
    cause: &str,
) -> AppResult<Order> {
    let new_total = to_f64(
        (to_decimal(existing.subtotal) - to_decimal(new_discount) + to_decimal(new_shipping)
            - to_decimal(existing.credit_applied))
        .max(Decimal::ZERO),
    );

    let stamp = chrono::DateTime::from_timestamp_millis(shared::util::now_millis())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    let audit_line = format!(
        "[{stamp}] admin {acting_admin_id} ({cause}): discount {:.2} -> {:.2}, shipping {:.2} -> {:.2}, total {:.2} -> {:.2}",
        existing.discount_amount,
        new_discount,
        existing.shipping_cost,
        new_shipping,
        existing.total,
        new_total,
    );
    let admin_notes = match existing.admin_notes.as_deref() {
        Some(notes) if !notes.is_empty() => format!("{notes}\n{audit_line}"),
        _ => audit_line,
    };

    order::update_money(
        pool,
        existing.id,
        new_discount,
        new_shipping,
        new_total,
        &admin_notes,
    )
    .await?;

    tracing::info!(
        order_id = existing.id,
        admin_id = acting_admin_id,
        new_total,
        "Order money fields edited"
    );

    order::find_by_id(pool, existing.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", existing.id)))
}
