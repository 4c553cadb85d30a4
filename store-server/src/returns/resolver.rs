//! Returns / Refund Resolver
//!
//! State machine: `pending` → approved (store/partial credit), denied,
//! refund_pending → refunded, or replacement_pending. A return that has
//! left `pending` can never be processed again, and an order carries at
//! most one non-denied return at a time.

use crate::core::Config;
use crate::credit;
use crate::db::repository::{order, returns};
use crate::money::{to_decimal, validate_money, validate_quantity};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_REASON_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::ReturnRequest;
use shared::types::{LedgerEntryType, ResolutionType, ReturnStatus};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One returned line: subset of the order's items, by quantity.
#[derive(Debug, Clone)]
pub struct ReturnLineInput {
    pub order_item_id: i64,
    pub quantity: i64,
}

/// Customer-side request to open a return.
#[derive(Debug, Clone)]
pub struct OpenReturnRequest {
    pub order_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub detail: Option<String>,
    pub items: Vec<ReturnLineInput>,
}

/// Admin-side decision on a pending return.
#[derive(Debug, Clone)]
pub struct ProcessReturnRequest {
    pub return_id: i64,
    pub resolution_type: ResolutionType,
    pub resolution_amount: Option<f64>,
    pub admin_notes: Option<String>,
}

pub struct ReturnsResolver {
    pool: SqlitePool,
    config: Arc<Config>,
}

impl ReturnsResolver {
    pub fn new(pool: SqlitePool, config: Arc<Config>) -> Self {
        Self { pool, config }
    }

    /// Open a return against a fulfilled order.
    ///
    /// Eligibility: the caller owns the order, its status is
    /// shipped/delivered/fulfilled, it is inside the return window, and no
    /// other non-denied return exists for it.
    pub async fn open_return(&self, request: OpenReturnRequest) -> AppResult<ReturnRequest> {
        validate_required_text(&request.reason, "reason", MAX_REASON_LEN)?;
        validate_optional_text(&request.detail, "detail", MAX_NOTE_LEN)?;
        if request.items.is_empty() {
            return Err(AppError::validation("No items selected for return"));
        }
        for line in &request.items {
            validate_quantity(line.quantity, "return quantity")?;
        }

        let mut tx = self.pool.begin().await?;

        let target = order::find_by_id_tx(&mut tx, request.order_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Order {} not found", request.order_id))
            })?;
        if target.user_id != request.user_id {
            return Err(AppError::Forbidden("Not your order".into()));
        }
        if !target.status.is_returnable() {
            return Err(AppError::state(format!(
                "Orders in status {} are not eligible for return",
                target.status.as_str()
            )));
        }
        let age_millis = shared::util::now_millis() - target.created_at;
        if age_millis > self.config.return_window_days * MILLIS_PER_DAY {
            return Err(AppError::state(format!(
                "Return window ({} days) has closed",
                self.config.return_window_days
            )));
        }
        if returns::blocking_return_exists(&mut tx, request.order_id).await? {
            return Err(AppError::conflict(
                "A return is already open for this order",
            ));
        }

        // Requested lines must be a subset of the order's lines, by quantity,
        // net of anything already committed to earlier (non-denied) returns.
        let order_items = order::find_items_tx(&mut tx, request.order_id).await?;
        let by_id: HashMap<i64, i64> = order_items.iter().map(|i| (i.id, i.quantity)).collect();
        for line in &request.items {
            let Some(ordered_qty) = by_id.get(&line.order_item_id) else {
                return Err(AppError::validation(format!(
                    "Item {} does not belong to order {}",
                    line.order_item_id, request.order_id
                )));
            };
            let already = returns::returned_quantity_for_item(&mut tx, line.order_item_id).await?;
            if line.quantity + already > *ordered_qty {
                return Err(AppError::validation(format!(
                    "Cannot return {} of item {}: only {} remain returnable",
                    line.quantity,
                    line.order_item_id,
                    ordered_qty - already
                )));
            }
        }

        let return_id = shared::util::snowflake_id();
        returns::insert_return(
            &mut tx,
            return_id,
            request.order_id,
            request.user_id,
            &request.reason,
            request.detail.as_deref(),
        )
        .await?;
        for line in &request.items {
            returns::insert_return_item(&mut tx, return_id, line.order_item_id, line.quantity)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(return_id, order_id = request.order_id, "Return opened");

        returns::require_exists(&self.pool, return_id)
            .await
            .map_err(Into::into)
    }

    /// Process a pending return (admin only). The status guard inside the
    /// UPDATE makes a second processing attempt fail with `Conflict`, even
    /// under concurrency.
    pub async fn process_return(&self, request: ProcessReturnRequest) -> AppResult<ReturnRequest> {
        validate_optional_text(&request.admin_notes, "admin_notes", MAX_NOTE_LEN)?;

        let existing = returns::require_exists(&self.pool, request.return_id).await?;
        if existing.status.is_processed() {
            return Err(AppError::conflict(format!(
                "Return {} has already been processed ({})",
                request.return_id,
                existing.status.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;

        let (new_status, amount) = match request.resolution_type {
            ResolutionType::Denied => (ReturnStatus::Denied, None),
            ResolutionType::StoreCredit | ResolutionType::PartialCredit => {
                let amount = request
                    .resolution_amount
                    .ok_or_else(|| AppError::validation("resolution_amount is required"))?;
                validate_money(amount, "resolution_amount")?;
                if amount <= 0.0 {
                    return Err(AppError::validation("resolution_amount must be positive"));
                }
                credit::credit(
                    &mut tx,
                    existing.user_id,
                    to_decimal(amount),
                    Some(existing.order_id),
                    LedgerEntryType::Credit,
                    &format!("Return {} resolved as store credit", existing.id),
                )
                .await?;
                (ReturnStatus::Approved, Some(amount))
            }
            ResolutionType::FullRefund => {
                if let Some(amount) = request.resolution_amount {
                    validate_money(amount, "resolution_amount")?;
                }
                // Money moves out of band through the payment processor; the
                // return parks until complete_refund() confirms it
                (ReturnStatus::RefundPending, request.resolution_amount)
            }
            // No automated replacement-order creation: the return parks for
            // manual handling
            ResolutionType::Replacement => (ReturnStatus::ReplacementPending, None),
        };

        let resolved = returns::resolve_pending(
            &mut tx,
            request.return_id,
            new_status,
            request.resolution_type,
            amount,
            request.admin_notes.as_deref(),
        )
        .await?;
        if !resolved {
            // Lost the race against another processor; nothing was applied
            return Err(AppError::conflict(format!(
                "Return {} has already been processed",
                request.return_id
            )));
        }

        tx.commit().await?;
        tracing::info!(
            return_id = request.return_id,
            resolution = ?request.resolution_type,
            "Return processed"
        );

        returns::require_exists(&self.pool, request.return_id)
            .await
            .map_err(Into::into)
    }

    /// Confirm the out-of-band payment-processor refund. Only a return
    /// currently `refund_pending` may be completed.
    pub async fn complete_refund(&self, return_id: i64) -> AppResult<ReturnRequest> {
        let existing = returns::require_exists(&self.pool, return_id).await?;
        if !returns::complete_refund(&self.pool, return_id).await? {
            return Err(AppError::state(format!(
                "Return {} is not awaiting refund (status {})",
                return_id,
                existing.status.as_str()
            )));
        }
        tracing::info!(return_id, "Refund completed");
        returns::require_exists(&self.pool, return_id)
            .await
            .map_err(Into::into)
    }
}
