//! Settlement of prior outstanding balances.

use bursary_shared::types::OutstandingBalanceId;
use rust_decimal::Decimal;

use super::error::BillingError;

/// An outstanding balance as seen when planning a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingSnapshot {
    /// Balance row.
    pub id: OutstandingBalanceId,
    /// Amount still owed.
    pub amount: Decimal,
}

/// Change to apply to one outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAdjustment {
    /// Balance is paid in full and the row is removed.
    Clear {
        /// Balance row.
        id: OutstandingBalanceId,
        /// Amount consumed.
        amount: Decimal,
    },
    /// Balance is paid in part and the row keeps the rest.
    Reduce {
        /// Balance row.
        id: OutstandingBalanceId,
        /// Amount consumed.
        amount: Decimal,
        /// Amount left owing.
        left: Decimal,
    },
}

impl BalanceAdjustment {
    /// Balance row the adjustment applies to.
    #[must_use]
    pub const fn id(&self) -> OutstandingBalanceId {
        match self {
            Self::Clear { id, .. } | Self::Reduce { id, .. } => *id,
        }
    }

    /// Amount of the payment consumed by this adjustment.
    #[must_use]
    pub const fn consumed(&self) -> Decimal {
        match self {
            Self::Clear { amount, .. } | Self::Reduce { amount, .. } => *amount,
        }
    }
}

/// How an incoming amount is split against existing debt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Changes to apply, oldest balance first.
    pub adjustments: Vec<BalanceAdjustment>,
    /// Total consumed by debt.
    pub deducted: Decimal,
    /// Amount left for forward allocation.
    pub remaining: Decimal,
}

impl SettlementPlan {
    /// Plans a settlement of `amount` against `balances`.
    ///
    /// `balances` must be ordered oldest first. Each balance not larger than
    /// what is left is cleared; the first larger one is reduced and ends the
    /// walk. Non-positive balances are cleared without consuming anything.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount` is not positive.
    pub fn compute(
        balances: &[OutstandingSnapshot],
        amount: Decimal,
    ) -> Result<Self, BillingError> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(amount));
        }

        let mut left = amount;
        let mut adjustments = Vec::with_capacity(balances.len());

        for balance in balances {
            if balance.amount <= Decimal::ZERO {
                adjustments.push(BalanceAdjustment::Clear {
                    id: balance.id,
                    amount: Decimal::ZERO,
                });
                continue;
            }
            if left <= Decimal::ZERO {
                break;
            }
            if balance.amount <= left {
                left -= balance.amount;
                adjustments.push(BalanceAdjustment::Clear {
                    id: balance.id,
                    amount: balance.amount,
                });
            } else {
                adjustments.push(BalanceAdjustment::Reduce {
                    id: balance.id,
                    amount: left,
                    left: balance.amount - left,
                });
                left = Decimal::ZERO;
            }
        }

        Ok(Self {
            adjustments,
            deducted: amount - left,
            remaining: left,
        })
    }

    /// Returns true if any debt was paid.
    #[must_use]
    pub fn has_deduction(&self) -> bool {
        self.deducted > Decimal::ZERO
    }

    /// Returns the balance that survives in reduced form, if any.
    #[must_use]
    pub fn surviving_balance_id(&self) -> Option<OutstandingBalanceId> {
        self.adjustments.iter().find_map(|adj| match adj {
            BalanceAdjustment::Reduce { id, .. } => Some(*id),
            BalanceAdjustment::Clear { .. } => None,
        })
    }
}
