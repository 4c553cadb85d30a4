//! Order Settlement Engine
//!
//! The single atomic transaction that turns a validated cart + optional code
//! + delivery choice into a persisted order. Every step before commit is
//! all-or-nothing: a failure anywhere rolls the transaction back with no
//! stock, usage, or ledger movement. Notification dispatch and the low-stock
//! check run after commit, fire-and-forget.
//!
//! Race-sensitive mutations (stock decrement, usage increment, credit debit)
//! are conditional UPDATEs re-checked inside the transaction — two
//! concurrent checkouts against the last unit of stock cannot both succeed.

use crate::core::Config;
use crate::credit;
use crate::db::repository::{RepoError, acknowledgment, discount_code, order, product, user};
use crate::marketing::{self, DiscountOutcome, ReferralRole};
use crate::money::{to_decimal, to_f64, validate_quantity};
use crate::notify::Notifier;
use crate::orders::gen_order_number;
use crate::pricing::{self, ResolvedPrice};
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};
use rust_decimal::Decimal;
use shared::models::{Order, OrderItemDetail, Product};
use shared::types::{DeliveryMethod, PriceBasis, ReferrerChoice};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Fail closed instead of leaving a settlement half-applied under storage
/// stalls. The dropped transaction rolls back.
const SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts to find a free order number before giving up.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Attestation text version recorded with every checkout acknowledgment.
const CHECKOUT_ATTESTATION_TEXT: &str =
    "Purchaser attests all materials are for laboratory research use only, \
     not for human or animal consumption.";

/// SHA-256 prefix identifying the attestation text version the user saw.
fn ack_version_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// One cart line as submitted by the storefront.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Checkout request. `final_attestation` is the compliance gate: the engine
/// rejects the call outright when it is false, independent of cart contents.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: i64,
    pub items: Vec<CartLine>,
    pub discount_code: Option<String>,
    pub referrer_choice: Option<ReferrerChoice>,
    pub delivery_method: DeliveryMethod,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub apply_credit: bool,
    pub final_attestation: bool,
    pub ip_address: Option<String>,
}

/// Settled order plus its frozen lines.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    /// The supplied code was valid but the whole cart was sale-priced, so it
    /// was not applied (and not consumed).
    pub code_not_applicable: bool,
}

/// Orchestrates pricing, code evaluation, credit application, and
/// persistence.
pub struct SettlementEngine {
    pool: SqlitePool,
    config: Arc<Config>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl SettlementEngine {
    pub fn new(pool: SqlitePool, config: Arc<Config>) -> Self {
        Self {
            pool,
            config,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Place an order. Steps 1–7 of the settlement run in one transaction;
    /// notifications fire after commit and never affect the result.
    pub async fn place_order(&self, request: CheckoutRequest) -> AppResult<SettlementOutcome> {
        // Compliance gate before anything else
        if !request.final_attestation {
            return Err(AppError::validation("Final attestation is required"));
        }
        if request.items.is_empty() {
            return Err(AppError::validation("Cart is empty"));
        }
        for line in &request.items {
            validate_quantity(line.quantity, "quantity")?;
        }
        validate_optional_text(&request.notes, "notes", MAX_NOTE_LEN)?;
        validate_optional_text(&request.shipping_address, "shipping_address", MAX_ADDRESS_LEN)?;

        let now = shared::util::now_millis();
        let (order_id, order_number, code_not_applicable) =
            match tokio::time::timeout(SETTLEMENT_TIMEOUT, self.settle(&request, now)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::error!(user_id = request.user_id, "Settlement timed out, rolled back");
                    return Err(AppError::Internal("Settlement timed out".into()));
                }
            };

        tracing::info!(
            order_number = %order_number,
            user_id = request.user_id,
            "Order settled"
        );

        let order = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::Internal("Settled order vanished".into()))?;
        let items = order::find_items(&self.pool, order_id).await?;

        // Step 8: best-effort side effects, never block or fail the order
        if let Some(notifier) = &self.notifier {
            let notifier = Arc::clone(notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.send_order_confirmation(order_id).await {
                    tracing::warn!(order_id, error = %e, "Order confirmation dispatch failed");
                }
                if let Err(e) = notifier.send_low_stock_alert().await {
                    tracing::warn!(error = %e, "Low stock check failed");
                }
            });
        }

        Ok(SettlementOutcome {
            order,
            items,
            code_not_applicable,
        })
    }

    /// The transactional core: resolve prices, evaluate the code, apply
    /// credit, persist everything. Returns (order id, order number,
    /// code_not_applicable).
    async fn settle(
        &self,
        request: &CheckoutRequest,
        now: i64,
    ) -> AppResult<(i64, String, bool)> {
        let mut tx = self.pool.begin().await?;

        let buyer = user::find_by_id_tx(&mut tx, request.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", request.user_id)))?;
        if !buyer.is_active {
            return Err(AppError::Forbidden("Account is deactivated".into()));
        }

        // Step 1: resolve every line before touching anything — no partial
        // orders.
        let mut resolved_lines: Vec<(Product, i64, ResolvedPrice)> =
            Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;
        let mut eligible_subtotal = Decimal::ZERO;

        for line in &request.items {
            let p = product::find_by_id_tx(&mut tx, line.product_id).await?;
            let p = match p {
                Some(p) if p.is_active => p,
                _ => {
                    return Err(AppError::not_found(format!(
                        "Product {} not found",
                        line.product_id
                    )));
                }
            };
            if p.stock < line.quantity {
                return Err(AppError::conflict(format!(
                    "Insufficient stock for {}",
                    p.name
                )));
            }

            let resolved = pricing::resolve_unit_price(&p, line.quantity, now);
            let extension = resolved.extension(line.quantity);
            subtotal += extension;
            if resolved.basis != PriceBasis::Sale {
                eligible_subtotal += extension;
            }
            resolved_lines.push((p, line.quantity, resolved));
        }

        // Step 2: discount / referral evaluation
        let mut discount = Decimal::ZERO;
        let mut discount_code_id = None;
        let mut referral = ReferralRole::None;
        let mut code_not_applicable = false;

        if let Some(code_str) = request.discount_code.as_deref()
            && !code_str.trim().is_empty()
        {
            let code = discount_code::find_by_code_tx(&mut tx, code_str)
                .await?
                .ok_or_else(|| AppError::not_found("Invalid or unknown code"))?;
            let eval = marketing::evaluate_code(
                &code,
                subtotal,
                eligible_subtotal,
                request.user_id,
                request.referrer_choice,
                now,
            )?;
            match eval.outcome {
                DiscountOutcome::Applied(amount) => {
                    discount = amount;
                    discount_code_id = Some(eval.code_id);
                    referral = eval.referral;
                }
                DiscountOutcome::NotApplicable => {
                    // Whole cart is sale-priced: proceed without the code,
                    // leaving its usage counter untouched.
                    tracing::info!(code = %code.code, "Code not applicable to all-sale cart, skipped");
                    code_not_applicable = true;
                }
            }
        }

        // Step 3: shipping
        let shipping = match request.delivery_method {
            DeliveryMethod::Ship => to_decimal(self.config.shipping_fee),
            DeliveryMethod::Pickup => Decimal::ZERO,
        };

        // Step 4: capped credit application
        let mut credit_applied = Decimal::ZERO;
        if request.apply_credit {
            let payable = (subtotal - discount + shipping).max(Decimal::ZERO);
            credit_applied = to_decimal(buyer.referral_credit).min(payable).max(Decimal::ZERO);
        }

        // Step 5: clamped total
        let total = (subtotal - discount + shipping - credit_applied).max(Decimal::ZERO);

        // Step 6: unique order number, retried on collision
        let order_id = shared::util::snowflake_id();
        let mut order_number = None;
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let candidate = gen_order_number();
            let row = order::NewOrderRow {
                id: order_id,
                user_id: request.user_id,
                order_number: candidate.clone(),
                subtotal: to_f64(subtotal),
                discount_amount: to_f64(discount),
                discount_code_id,
                shipping_cost: to_f64(shipping),
                credit_applied: to_f64(credit_applied),
                total: to_f64(total),
                delivery_method: request.delivery_method,
                notes: request.notes.clone(),
                shipping_address: request.shipping_address.clone(),
            };
            match order::insert_order(&mut tx, &row).await {
                Ok(()) => {
                    order_number = Some(candidate);
                    break;
                }
                Err(RepoError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let order_number = order_number
            .ok_or_else(|| AppError::Internal("Could not allocate a unique order number".into()))?;

        // Step 7: line items + race-free stock decrements
        for (p, quantity, resolved) in &resolved_lines {
            order::insert_item(
                &mut tx,
                order_id,
                p.id,
                *quantity,
                to_f64(resolved.unit_price),
                resolved.basis,
            )
            .await?;
            if !order::decrement_stock(&mut tx, p.id, *quantity).await? {
                return Err(AppError::conflict(format!(
                    "Insufficient stock for {}",
                    p.name
                )));
            }
        }

        // Usage counter moves only now that the order is real
        if let Some(code_id) = discount_code_id
            && !discount_code::increment_usage(&mut tx, code_id).await?
        {
            return Err(AppError::conflict("Code has reached its usage limit"));
        }

        // Credit debit re-checks the balance under the same transaction —
        // no double-spend across two simultaneous orders
        if credit_applied > Decimal::ZERO {
            credit::debit(
                &mut tx,
                request.user_id,
                credit_applied,
                Some(order_id),
                &format!("Store credit applied to order {order_number}"),
            )
            .await?;
        }

        // Referral earnings, per the combined/split rule
        match &referral {
            ReferralRole::Referrer {
                user_id: referrer_id,
                commission,
            } if *commission > Decimal::ZERO => {
                credit::credit(
                    &mut tx,
                    *referrer_id,
                    *commission,
                    Some(order_id),
                    shared::types::LedgerEntryType::Earned,
                    &format!("Referral commission for order {order_number}"),
                )
                .await?;
            }
            ReferralRole::SelfSplit { commission } if *commission > Decimal::ZERO => {
                credit::credit(
                    &mut tx,
                    request.user_id,
                    *commission,
                    Some(order_id),
                    shared::types::LedgerEntryType::Earned,
                    &format!("Self-referral commission for order {order_number}"),
                )
                .await?;
            }
            _ => {}
        }

        // Compliance acknowledgment record
        acknowledgment::insert(
            &mut tx,
            request.user_id,
            "checkout_attestation",
            request.ip_address.as_deref(),
            &ack_version_hash(CHECKOUT_ATTESTATION_TEXT),
        )
        .await?;

        tx.commit().await?;
        Ok((order_id, order_number, code_not_applicable))
    }
}
