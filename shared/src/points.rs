use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::error::OrderError;

/// Apply the full-points-only policy.
///
/// Negative requests are clamped to zero. The clamped amount must cover the
/// subtotal exactly: anything short of it or beyond it is a partial payment,
/// which has no settlement path. Returns the amount of points to debit.
pub fn check_full_payment(use_point: i32, subtotal: &BigDecimal) -> Result<i32, OrderError> {
    let use_point = use_point.max(0);
    let remainder = subtotal - BigDecimal::from(use_point);

    if !remainder.is_zero() {
        return Err(OrderError::PartialPaymentNotSupported {
            subtotal: subtotal.clone(),
            use_point,
        });
    }

    Ok(use_point)
}

/// Balance check performed before the debit is issued.
pub fn check_balance(balance: i32, use_point: i32) -> Result<(), OrderError> {
    if balance < use_point {
        return Err(OrderError::InsufficientPoints {
            requested: use_point,
            available: balance,
        });
    }
    Ok(())
}
