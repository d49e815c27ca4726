//! Forward allocation of what is left after settling prior debt.

use rust_decimal::Decimal;

use super::error::BillingError;
use super::settlement::SettlementPlan;

/// Fee due for one period after any discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeAssessment {
    /// Canonical amount of the payment type.
    pub fee: Decimal,
    /// Discount granted for the period.
    pub discount: Decimal,
}

impl FeeAssessment {
    /// Creates an assessment without a discount.
    #[must_use]
    pub const fn undiscounted(fee: Decimal) -> Self {
        Self {
            fee,
            discount: Decimal::ZERO,
        }
    }

    /// Fee minus discount, floored at zero.
    #[must_use]
    pub fn effective_fee(&self) -> Decimal {
        (self.fee - self.discount).max(Decimal::ZERO)
    }

    /// Returns true if the discount covers the whole fee.
    #[must_use]
    pub fn is_waived(&self) -> bool {
        self.effective_fee() == Decimal::ZERO
    }
}

/// Split of a forward payment into the amount posted and the shortfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardAllocation {
    /// Amount recorded as the period's regular payment.
    pub paid: Decimal,
    /// Shortfall that becomes a new outstanding balance.
    pub carried_forward: Decimal,
}

impl ForwardAllocation {
    /// Applies `remaining` to a period whose effective fee is `due`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `remaining` is not positive
    /// - `Overpayment` if `remaining` is larger than `due`
    pub fn compute(remaining: Decimal, due: Decimal) -> Result<Self, BillingError> {
        if remaining <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(remaining));
        }
        if remaining > due {
            return Err(BillingError::Overpayment {
                amount: remaining,
                due,
            });
        }

        Ok(Self {
            paid: remaining,
            carried_forward: due - remaining,
        })
    }

    /// Returns true if part of the fee is still owed.
    #[must_use]
    pub fn has_shortfall(&self) -> bool {
        self.carried_forward > Decimal::ZERO
    }
}

/// Complete plan for one incoming payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Settlement of prior debt.
    pub settlement: SettlementPlan,
    /// Forward allocation, present when anything remains after settlement.
    pub forward: Option<ForwardAllocation>,
}

impl AllocationPlan {
    /// Total amount posted as payments.
    #[must_use]
    pub fn posted_total(&self) -> Decimal {
        self.settlement.deducted + self.forward.map_or(Decimal::ZERO, |f| f.paid)
    }

    /// Outstanding balance created by this plan.
    #[must_use]
    pub fn new_outstanding(&self) -> Decimal {
        self.forward.map_or(Decimal::ZERO, |f| f.carried_forward)
    }
}

/// Stateless planner for incoming payments.
pub struct AllocationService;

impl AllocationService {
    /// Validates the payment method label.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmountType` if the label is blank or longer than 50 characters.
    pub fn validate_amount_type(amount_type: &str) -> Result<(), BillingError> {
        let trimmed = amount_type.trim();
        if trimmed.is_empty() {
            return Err(BillingError::InvalidAmountType(
                "amount type is required".to_string(),
            ));
        }
        if trimmed.chars().count() > 50 {
            return Err(BillingError::InvalidAmountType(
                "amount type must be at most 50 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Completes a plan once the settlement is known.
    ///
    /// `fee` is the assessment of the forward period. Callers only need to
    /// resolve it when the settlement leaves something over; a missing
    /// assessment counts as nothing due.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`ForwardAllocation::compute`].
    pub fn plan(
        settlement: SettlementPlan,
        fee: Option<FeeAssessment>,
    ) -> Result<AllocationPlan, BillingError> {
        let forward = if settlement.remaining > Decimal::ZERO {
            let due = fee.map_or(Decimal::ZERO, |f| f.effective_fee());
            Some(ForwardAllocation::compute(settlement.remaining, due)?)
        } else {
            None
        };

        Ok(AllocationPlan {
            settlement,
            forward,
        })
    }
}
