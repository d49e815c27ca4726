//! Property-based tests for payment allocation.
//!
//! - Conservation: payments posted by a plan add up to the incoming amount
//! - Debt is always settled before anything is applied forward
//! - A shortfall is exactly the unpaid part of the effective fee

use bursary_shared::types::OutstandingBalanceId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::{AllocationService, FeeAssessment};
use super::error::BillingError;
use super::settlement::{BalanceAdjustment, OutstandingSnapshot, SettlementPlan};

/// Strategy for positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for up to three existing balances.
fn balances() -> impl Strategy<Value = Vec<OutstandingSnapshot>> {
    prop::collection::vec(positive_amount(), 0..3).prop_map(|amounts| {
        amounts
            .into_iter()
            .map(|amount| OutstandingSnapshot {
                id: OutstandingBalanceId::new(),
                amount,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_settlement_splits_amount_exactly(
        existing in balances(),
        amount in positive_amount(),
    ) {
        let plan = SettlementPlan::compute(&existing, amount).unwrap();
        let debt: Decimal = existing.iter().map(|b| b.amount).sum();

        prop_assert_eq!(plan.deducted + plan.remaining, amount);
        prop_assert_eq!(plan.deducted, debt.min(amount));
        let consumed: Decimal = plan.adjustments.iter().map(BalanceAdjustment::consumed).sum();
        prop_assert_eq!(consumed, plan.deducted);
        prop_assert!(plan.remaining.is_zero() || plan.surviving_balance_id().is_none());
    }

    #[test]
    fn prop_plan_conserves_money(
        existing in balances(),
        amount in positive_amount(),
        fee in positive_amount(),
        discount in 0i64..500_000i64,
    ) {
        let settlement = SettlementPlan::compute(&existing, amount).unwrap();
        let assessment = FeeAssessment { fee, discount: Decimal::new(discount, 2) };
        let due = assessment.effective_fee();
        let leftover = settlement.remaining;

        match AllocationService::plan(settlement, Some(assessment)) {
            Ok(plan) => {
                prop_assert_eq!(plan.posted_total(), amount);
                if let Some(forward) = plan.forward {
                    prop_assert_eq!(forward.paid + forward.carried_forward, due);
                    prop_assert!(forward.carried_forward >= Decimal::ZERO);
                }
            }
            Err(BillingError::Overpayment { amount: over, due: rejected_due }) => {
                prop_assert_eq!(over, leftover);
                prop_assert!(over > rejected_due);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
