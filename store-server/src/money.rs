//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done with `Decimal` internally and converted to
//! `f64` only at the storage/serialization boundary. Rounding happens once,
//! at that boundary — never mid-calculation.

use crate::utils::AppError;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per unit
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

/// Validate that an f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{field_name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate a monetary amount at the input boundary: finite, non-negative,
/// below the sanity ceiling.
pub fn validate_money(value: f64, field_name: &str) -> Result<(), AppError> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{field_name} must be non-negative, got {value}"
        )));
    }
    if value > MAX_PRICE {
        return Err(AppError::validation(format!(
            "{field_name} exceeds maximum allowed ({MAX_PRICE}), got {value}"
        )));
    }
    Ok(())
}

/// Validate a percentage in [0, 100].
pub fn validate_percent(value: f64, field_name: &str) -> Result<(), AppError> {
    require_finite(value, field_name)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(AppError::validation(format!(
            "{field_name} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

/// Validate an order line quantity.
pub fn validate_quantity(quantity: i64, field_name: &str) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "{field_name} must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "{field_name} exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
///
/// Input values should be pre-validated via `validate_money()` at the
/// boundary. If NaN/Infinity somehow reaches here, logs an error and returns
/// ZERO to avoid silent corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // Decimal rounded to 2dp with boundary-validated inputs is always
        // representable as f64
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64_rounds_half_up() {
        assert_eq!(to_f64(Decimal::new(12345, 3)), 12.35); // 12.345 -> 12.35
        assert_eq!(to_f64(Decimal::new(12344, 3)), 12.34); // 12.344 -> 12.34
    }

    #[test]
    fn test_bulk_unit_price_no_drift() {
        // 578 / 10 stays exact in Decimal
        let unit = to_decimal(578.0) / Decimal::from(10);
        assert_eq!(to_f64(unit), 57.8);
        // and extends back without float drift
        assert_eq!(to_f64(unit * Decimal::from(10)), 578.0);
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(10.0, 10.004));
        assert!(!money_eq(10.0, 10.02));
    }

    #[test]
    fn test_validate_money_bounds() {
        assert!(validate_money(0.0, "price").is_ok());
        assert!(validate_money(99.99, "price").is_ok());
        assert!(validate_money(-0.01, "price").is_err());
        assert!(validate_money(f64::NAN, "price").is_err());
        assert!(validate_money(f64::INFINITY, "price").is_err());
        assert!(validate_money(2_000_000.0, "price").is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1, "quantity").is_ok());
        assert!(validate_quantity(0, "quantity").is_err());
        assert!(validate_quantity(-3, "quantity").is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1, "quantity").is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent(0.0, "discount_percent").is_ok());
        assert!(validate_percent(100.0, "discount_percent").is_ok());
        assert!(validate_percent(100.1, "discount_percent").is_err());
        assert!(validate_percent(-1.0, "discount_percent").is_err());
    }
}
