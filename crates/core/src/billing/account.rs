//! Cash account balance rules.

use rust_decimal::Decimal;

use super::error::BillingError;

/// Returns the balance after crediting `amount` to `current`.
///
/// Accounts only grow from collections, so the amount must be positive.
///
/// # Errors
///
/// - `InvalidAmount` if `amount` is zero or negative
/// - `BalanceOverflow` if the sum does not fit in a `Decimal`
pub fn credit_balance(current: Decimal, amount: Decimal) -> Result<Decimal, BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::InvalidAmount(amount));
    }
    current
        .checked_add(amount)
        .ok_or(BillingError::BalanceOverflow {
            balance: current,
            amount,
        })
}
