//! Billing error types.

use bursary_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::CalendarError;

/// Errors raised by the pure billing rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Monetary amount must be strictly positive.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// Payment method label is empty or too long.
    #[error("Invalid amount type: {0}")]
    InvalidAmountType(String),

    /// Payment exceeds prior debt plus the fee of the next period.
    #[error("Payment of {amount} exceeds the {due} currently due")]
    Overpayment {
        /// Amount left after settling prior debt.
        amount: Decimal,
        /// Effective fee of the target period.
        due: Decimal,
    },

    /// The account is closed or frozen.
    #[error("Account {0} is not active")]
    AccountNotActive(Uuid),

    /// Crediting the amount would overflow the account balance.
    #[error("Crediting {amount} to a balance of {balance} overflows")]
    BalanceOverflow {
        /// Balance before the credit.
        balance: Decimal,
        /// Amount credited.
        amount: Decimal,
    },

    /// Every generated receipt number collided with an existing one.
    #[error("Could not generate a unique receipt number after {attempts} attempts")]
    ReceiptNumberExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// Period resolution failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl BillingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidAmountType(_) => "invalid_amount_type",
            Self::Overpayment { .. } => "overpayment",
            Self::AccountNotActive(_) => "account_not_active",
            Self::BalanceOverflow { .. } => "balance_overflow",
            Self::ReceiptNumberExhausted { .. } => "receipt_number_exhausted",
            Self::Calendar(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) | Self::InvalidAmountType(_) | Self::Overpayment { .. } => 400,
            Self::AccountNotActive(_) | Self::BalanceOverflow { .. } => 422,
            Self::ReceiptNumberExhausted { .. } => 500,
            Self::Calendar(err) => err.http_status_code(),
        }
    }

    /// Returns true if the same request may succeed when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReceiptNumberExhausted { .. })
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        Self::Rule {
            status: err.http_status_code(),
            code: err.error_code(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}
