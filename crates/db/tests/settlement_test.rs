//! Outstanding balance settlement tests.

mod common;

use bursary_core::billing::BillingError;
use bursary_db::repositories::{BalanceKey, OutstandingBalanceRepository, SettleError};
use common::{Fixture, seed_outstanding, setup};
use rust_decimal_macros::dec;

fn key(fx: &Fixture) -> BalanceKey {
    BalanceKey {
        student_id: fx.student.id,
        payment_type_id: fx.payment_type.id,
    }
}

#[tokio::test]
async fn test_settlement_exhausts_balance_and_reports_remainder() {
    let fx = setup().await;
    seed_outstanding(&fx.db, &fx, fx.period(0, 0), dec!(2000)).await;
    let repo = OutstandingBalanceRepository::new(fx.db.clone());

    let plan = repo.settle(key(&fx), dec!(3000)).await.unwrap();

    assert_eq!(plan.deducted, dec!(2000));
    assert_eq!(plan.remaining, dec!(1000));
    assert!(repo.list_open(key(&fx)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_settlement_decrements_balance() {
    let fx = setup().await;
    let balance = seed_outstanding(&fx.db, &fx, fx.period(0, 0), dec!(2000)).await;
    let repo = OutstandingBalanceRepository::new(fx.db.clone());

    let plan = repo.settle(key(&fx), dec!(500)).await.unwrap();

    assert_eq!(plan.deducted, dec!(500));
    assert_eq!(plan.remaining, dec!(0));
    let open = repo.list_open(key(&fx)).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, balance.id);
    assert_eq!(open[0].amount, dec!(1500));
}

#[tokio::test]
async fn test_oldest_balance_settles_first() {
    let fx = setup().await;
    let older = seed_outstanding(&fx.db, &fx, fx.period(0, 0), dec!(300)).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = seed_outstanding(&fx.db, &fx, fx.period(0, 1), dec!(400)).await;
    let repo = OutstandingBalanceRepository::new(fx.db.clone());

    let plan = repo.settle(key(&fx), dec!(500)).await.unwrap();

    assert_eq!(plan.deducted, dec!(500));
    let open = repo.list_open(key(&fx)).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, newer.id);
    assert_eq!(open[0].amount, dec!(200));
    assert_ne!(open[0].id, older.id);
}

#[tokio::test]
async fn test_no_balance_leaves_amount_untouched() {
    let fx = setup().await;
    let repo = OutstandingBalanceRepository::new(fx.db.clone());

    let plan = repo.settle(key(&fx), dec!(750)).await.unwrap();

    assert_eq!(plan.deducted, dec!(0));
    assert_eq!(plan.remaining, dec!(750));
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let fx = setup().await;
    let repo = OutstandingBalanceRepository::new(fx.db.clone());

    let err = repo.settle(key(&fx), dec!(-1)).await.unwrap_err();

    assert!(matches!(
        err,
        SettleError::Billing(BillingError::InvalidAmount(_))
    ));
}
