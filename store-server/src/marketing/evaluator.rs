//! Code Evaluator
//!
//! Validation runs in a fixed order — exists/active, expiry, usage limit,
//! minimum order — and each failure carries its own reason. Discount
//! amounts are computed on the eligible (non-sale) portion of the cart:
//! discount stacking with sale pricing is disallowed, so a cart priced
//! entirely on the Sale basis yields `NotApplicable` rather than an error.

use crate::money::to_decimal;
use crate::utils::{AppError, AppResult};
use rust_decimal::Decimal;
use shared::models::DiscountCode;
use shared::types::ReferrerChoice;

/// Discount outcome for the cart being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountOutcome {
    /// Discount applies; amount is unrounded.
    Applied(Decimal),
    /// Every line is sale-priced — the code cannot apply to this cart.
    NotApplicable,
}

/// Who earns what when the order settles.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferralRole {
    /// Plain discount code, or code skipped as not applicable.
    None,
    /// Someone else's code: the referrer earns the commission.
    Referrer { user_id: i64, commission: Decimal },
    /// Own code, `split`: normal discount now, commission to own ledger.
    SelfSplit { commission: Decimal },
    /// Own code, `combined`: commission folded into the discount, no credit.
    SelfCombined,
}

/// Result of evaluating a code against a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeEvaluation {
    pub code_id: i64,
    pub outcome: DiscountOutcome,
    pub referral: ReferralRole,
}

impl CodeEvaluation {
    /// Discount as a Decimal, zero when not applicable.
    pub fn discount(&self) -> Decimal {
        match self.outcome {
            DiscountOutcome::Applied(amount) => amount,
            DiscountOutcome::NotApplicable => Decimal::ZERO,
        }
    }
}

/// Evaluate `code` against a cart.
///
/// `subtotal` is the full cart value; `eligible_subtotal` excludes line
/// extensions priced on the Sale basis. Validation failures reject with a
/// specific reason; incrementing `times_used` is the settlement engine's
/// job, never done here.
pub fn evaluate_code(
    code: &DiscountCode,
    subtotal: Decimal,
    eligible_subtotal: Decimal,
    acting_user_id: i64,
    referrer_choice: Option<ReferrerChoice>,
    now_millis: i64,
) -> AppResult<CodeEvaluation> {
    if !code.is_active {
        return Err(AppError::validation(format!(
            "Code {} is no longer active",
            code.code
        )));
    }

    if let Some(expires_at) = code.expires_at
        && expires_at <= now_millis
    {
        return Err(AppError::conflict(format!("Code {} has expired", code.code)));
    }

    if let Some(limit) = code.usage_limit
        && code.times_used >= limit
    {
        return Err(AppError::conflict(format!(
            "Code {} has reached its usage limit",
            code.code
        )));
    }

    let min_order = to_decimal(code.min_order_amount);
    if subtotal < min_order {
        return Err(AppError::validation(format!(
            "Minimum order of {:.2} required for code {}",
            code.min_order_amount, code.code
        )));
    }

    // Sale pricing consumed the whole cart: nothing left for the code to
    // discount, and no referral earnings either — the code is simply not
    // applied.
    if eligible_subtotal <= Decimal::ZERO {
        return Ok(CodeEvaluation {
            code_id: code.id,
            outcome: DiscountOutcome::NotApplicable,
            referral: ReferralRole::None,
        });
    }

    let hundred = Decimal::ONE_HUNDRED;
    let percent = to_decimal(code.discount_percent);
    let commission = subtotal * to_decimal(code.commission_percent) / hundred;

    // Percent takes priority when > 0; flat amounts cap at the eligible
    // subtotal.
    let base_discount = if code.discount_percent > 0.0 {
        eligible_subtotal * percent / hundred
    } else {
        to_decimal(code.discount_amount).min(eligible_subtotal)
    };

    match code.referrer_user_id {
        None => Ok(CodeEvaluation {
            code_id: code.id,
            outcome: DiscountOutcome::Applied(base_discount),
            referral: ReferralRole::None,
        }),
        Some(referrer_id) if referrer_id != acting_user_id => Ok(CodeEvaluation {
            code_id: code.id,
            outcome: DiscountOutcome::Applied(base_discount),
            referral: ReferralRole::Referrer {
                user_id: referrer_id,
                commission,
            },
        }),
        Some(_) => match referrer_choice {
            None => Err(AppError::validation(
                "referrer_choice (combined or split) is required when using your own code",
            )),
            // Combined folds the commission into the discount. The sum is
            // deliberately uncapped — a rate above 100% just floors the
            // order total at zero downstream.
            Some(ReferrerChoice::Combined) => Ok(CodeEvaluation {
                code_id: code.id,
                outcome: DiscountOutcome::Applied(base_discount + commission),
                referral: ReferralRole::SelfCombined,
            }),
            Some(ReferrerChoice::Split) => Ok(CodeEvaluation {
                code_id: code.id,
                outcome: DiscountOutcome::Applied(base_discount),
                referral: ReferralRole::SelfSplit { commission },
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::to_f64;

    const NOW: i64 = 1_000_000;

    fn make_code() -> DiscountCode {
        DiscountCode {
            id: 1,
            code: "WELCOME10".into(),
            description: None,
            discount_percent: 10.0,
            discount_amount: 0.0,
            min_order_amount: 0.0,
            usage_limit: None,
            times_used: 0,
            referrer_user_id: None,
            commission_percent: 0.0,
            is_active: true,
            expires_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn dec(v: f64) -> Decimal {
        to_decimal(v)
    }

    #[test]
    fn test_percent_discount() {
        let code = make_code();
        let eval = evaluate_code(&code, dec(200.0), dec(200.0), 7, None, NOW).unwrap();
        assert_eq!(to_f64(eval.discount()), 20.0);
        assert_eq!(eval.referral, ReferralRole::None);
    }

    #[test]
    fn test_flat_discount_capped_at_eligible() {
        let mut code = make_code();
        code.discount_percent = 0.0;
        code.discount_amount = 50.0;
        // Eligible subtotal below the flat amount: cap applies
        let eval = evaluate_code(&code, dec(100.0), dec(30.0), 7, None, NOW).unwrap();
        assert_eq!(to_f64(eval.discount()), 30.0);
    }

    #[test]
    fn test_percent_priority_over_flat() {
        let mut code = make_code();
        code.discount_percent = 5.0;
        code.discount_amount = 99.0;
        let eval = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap();
        assert_eq!(to_f64(eval.discount()), 5.0);
    }

    #[test]
    fn test_inactive_code_rejected() {
        let mut code = make_code();
        code.is_active = false;
        let err = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_expired_code_rejected() {
        let mut code = make_code();
        code.expires_at = Some(NOW - 1);
        let err = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_future_expiry_accepted() {
        let mut code = make_code();
        code.expires_at = Some(NOW + 1);
        assert!(evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).is_ok());
    }

    #[test]
    fn test_exhausted_code_rejected() {
        let mut code = make_code();
        code.usage_limit = Some(3);
        code.times_used = 3;
        let err = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_min_order_rejected() {
        let mut code = make_code();
        code.min_order_amount = 150.0;
        let err = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_all_sale_cart_not_applicable() {
        let code = make_code();
        let eval = evaluate_code(&code, dec(100.0), Decimal::ZERO, 7, None, NOW).unwrap();
        assert_eq!(eval.outcome, DiscountOutcome::NotApplicable);
        assert_eq!(to_f64(eval.discount()), 0.0);
        assert_eq!(eval.referral, ReferralRole::None);
    }

    #[test]
    fn test_partial_sale_discount_on_eligible_only() {
        // 100 subtotal, 40 of it sale-priced: 10% applies to the other 60
        let code = make_code();
        let eval = evaluate_code(&code, dec(100.0), dec(60.0), 7, None, NOW).unwrap();
        assert_eq!(to_f64(eval.discount()), 6.0);
    }

    #[test]
    fn test_true_referral_commission() {
        let mut code = make_code();
        code.referrer_user_id = Some(42);
        code.commission_percent = 20.0;
        let eval = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap();
        assert_eq!(to_f64(eval.discount()), 10.0);
        assert_eq!(
            eval.referral,
            ReferralRole::Referrer {
                user_id: 42,
                commission: dec(20.0)
            }
        );
    }

    #[test]
    fn test_self_referral_requires_choice() {
        let mut code = make_code();
        code.referrer_user_id = Some(7);
        code.commission_percent = 20.0;
        let err = evaluate_code(&code, dec(100.0), dec(100.0), 7, None, NOW).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_self_referral_combined() {
        // discount 10% + commission 20% on subtotal 100 -> 30, no credit
        let mut code = make_code();
        code.referrer_user_id = Some(7);
        code.commission_percent = 20.0;
        let eval = evaluate_code(
            &code,
            dec(100.0),
            dec(100.0),
            7,
            Some(ReferrerChoice::Combined),
            NOW,
        )
        .unwrap();
        assert_eq!(to_f64(eval.discount()), 30.0);
        assert_eq!(eval.referral, ReferralRole::SelfCombined);
    }

    #[test]
    fn test_self_referral_split() {
        // discount 10 now, commission 20 to own ledger
        let mut code = make_code();
        code.referrer_user_id = Some(7);
        code.commission_percent = 20.0;
        let eval = evaluate_code(
            &code,
            dec(100.0),
            dec(100.0),
            7,
            Some(ReferrerChoice::Split),
            NOW,
        )
        .unwrap();
        assert_eq!(to_f64(eval.discount()), 10.0);
        assert_eq!(
            eval.referral,
            ReferralRole::SelfSplit {
                commission: dec(20.0)
            }
        );
    }

    #[test]
    fn test_combined_rate_uncapped_above_100() {
        // 60% + 70% = 130% of subtotal; evaluator does not cap — the order
        // total floors at zero downstream
        let mut code = make_code();
        code.discount_percent = 60.0;
        code.referrer_user_id = Some(7);
        code.commission_percent = 70.0;
        let eval = evaluate_code(
            &code,
            dec(100.0),
            dec(100.0),
            7,
            Some(ReferrerChoice::Combined),
            NOW,
        )
        .unwrap();
        assert_eq!(to_f64(eval.discount()), 130.0);
    }
}
