//! Code Preview
//!
//! Side-effect-free code check used before checkout (the "validate
//! discount" call). Looks up the code and runs the evaluator without
//! touching usage counters.

use super::{DiscountOutcome, evaluate_code};
use crate::money::{to_decimal, to_f64};
use crate::utils::{AppError, AppResult};
use serde::Serialize;
use shared::types::ReferrerChoice;
use sqlx::SqlitePool;

use crate::db::repository::discount_code;

/// What the storefront shows the customer before they commit.
#[derive(Debug, Clone, Serialize)]
pub struct CodePreview {
    pub code: String,
    pub code_id: i64,
    pub valid: bool,
    pub applicable: bool,
    pub discount_amount: f64,
    pub message: String,
}

/// Validate a code against a prospective cart. `eligible_subtotal` excludes
/// sale-priced value, same as at settlement.
pub async fn preview_code(
    pool: &SqlitePool,
    code_str: &str,
    subtotal: f64,
    eligible_subtotal: f64,
    acting_user_id: i64,
    referrer_choice: Option<ReferrerChoice>,
) -> AppResult<CodePreview> {
    let trimmed = code_str.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("No code provided"));
    }

    let code = discount_code::find_by_code(pool, trimmed)
        .await?
        .ok_or_else(|| AppError::not_found("Invalid or unknown code"))?;

    let now = shared::util::now_millis();
    let eval = evaluate_code(
        &code,
        to_decimal(subtotal),
        to_decimal(eligible_subtotal),
        acting_user_id,
        referrer_choice,
        now,
    )?;

    let preview = match eval.outcome {
        DiscountOutcome::Applied(amount) => {
            let message = if code.discount_percent > 0.0 {
                format!("{}% off", code.discount_percent)
            } else {
                format!("{:.2} off", code.discount_amount)
            };
            CodePreview {
                code: code.code.clone(),
                code_id: code.id,
                valid: true,
                applicable: true,
                discount_amount: to_f64(amount),
                message,
            }
        }
        DiscountOutcome::NotApplicable => CodePreview {
            code: code.code.clone(),
            code_id: code.id,
            valid: true,
            applicable: false,
            discount_amount: 0.0,
            message: "Code does not apply to sale-priced items".into(),
        },
    };

    Ok(preview)
}
