//! Receipt issuing and composition tests.

mod common;

use bursary_core::billing::{BillingError, ReceiptNumber, is_valid_receipt_number};
use bursary_db::repositories::receipt::{NewReceipt, issue_receipt_with};
use bursary_db::repositories::{
    PaymentError, PaymentRepository, ProcessPaymentInput, ReceiptRepository,
};
use common::{Fixture, setup};
use rust_decimal_macros::dec;
use sea_orm::TransactionTrait;

async fn first_receipt(fx: &Fixture) -> bursary_db::repositories::ReceiptData {
    let mut receipts = PaymentRepository::new(fx.db.clone())
        .process_payment(ProcessPaymentInput {
            student_id: fx.student.id,
            payment_type_id: fx.payment_type.id,
            amount: dec!(5000),
            amount_type: "cash".to_string(),
        })
        .await
        .unwrap();
    receipts.remove(0)
}

fn new_receipt(fx: &Fixture, payment_id: uuid::Uuid) -> NewReceipt {
    NewReceipt {
        student_id: fx.student.id,
        payment_id,
        discount_id: None,
        outstanding_id: None,
        enrollment_id: None,
        amount_paid: dec!(5000),
    }
}

#[tokio::test]
async fn test_taken_number_is_skipped() {
    let fx = setup().await;
    let existing = first_receipt(&fx).await;

    let fresh = ReceiptNumber::generate();
    let mut candidates = vec![
        ReceiptNumber::parse(&existing.receipt_number).unwrap(),
        fresh.clone(),
    ]
    .into_iter();

    let txn = fx.db.begin().await.unwrap();
    let issued = issue_receipt_with(&txn, new_receipt(&fx, existing.payment.id), 3, || {
        candidates.next().unwrap()
    })
    .await
    .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(issued.receipt_number, fresh.as_str());
}

#[tokio::test]
async fn test_exhausted_attempts_fail() {
    let fx = setup().await;
    let existing = first_receipt(&fx).await;
    let taken = ReceiptNumber::parse(&existing.receipt_number).unwrap();

    let txn = fx.db.begin().await.unwrap();
    let err = issue_receipt_with(&txn, new_receipt(&fx, existing.payment.id), 3, || {
        taken.clone()
    })
    .await
    .unwrap_err();
    txn.rollback().await.unwrap();

    assert!(matches!(
        err,
        PaymentError::Billing(BillingError::ReceiptNumberExhausted { attempts: 3 })
    ));
}

#[tokio::test]
async fn test_find_by_number_composes_receipt() {
    let fx = setup().await;
    let issued = first_receipt(&fx).await;
    assert!(is_valid_receipt_number(&issued.receipt_number));

    let found = ReceiptRepository::new(fx.db.clone())
        .find_by_number(&issued.receipt_number)
        .await
        .unwrap();

    assert_eq!(found, issued);
    assert_eq!(found.student.registration_number, fx.student.registration_number);
    assert_eq!(found.payment.payment_type, "Tuition");
    assert_eq!(found.class.unwrap().term, "First Term");
}

#[tokio::test]
async fn test_unknown_receipt_number() {
    let fx = setup().await;

    let err = ReceiptRepository::new(fx.db.clone())
        .find_by_number("00000000000")
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::ReceiptNotFound(_)));
}
