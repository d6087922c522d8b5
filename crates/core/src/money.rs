//! Monetary amount checks.
//!
//! Amounts are `rust_decimal::Decimal` values stored as `NUMERIC(18,2)`.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Maximum number of fractional digits an amount may carry.
pub const MONEY_SCALE: u32 = 2;

/// Validate a monetary amount: non-negative, at most two decimal places.
///
/// Returns the amount unchanged so it can be used inline in constructors.
pub fn ensure_money(amount: Decimal, field: &str) -> DomainResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(DomainError::validation(format!(
            "{field} cannot have more than {MONEY_SCALE} decimal places"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_cents() {
        assert!(ensure_money(Decimal::ZERO, "price").is_ok());
        assert!(ensure_money(Decimal::new(1999, 2), "price").is_ok());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        // 12.5000 is still 12.50
        assert!(ensure_money(Decimal::new(125000, 4), "price").is_ok());
    }

    #[test]
    fn rejects_negative_amounts() {
        let err = ensure_money(Decimal::new(-1, 0), "total").unwrap_err();
        assert_eq!(err, DomainError::validation("total cannot be negative"));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(ensure_money(Decimal::new(1001, 3), "price").is_err());
    }
}
