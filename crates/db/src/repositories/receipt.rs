//! Receipt issuing and receipt data composition.
//!
//! Receipt numbers are random, so a collision with an existing number is
//! possible. Each insert runs inside a savepoint: a unique violation rolls back
//! only that savepoint and the next candidate is tried.

use bursary_core::billing::{BillingError, ReceiptNumber};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::payment::PaymentError;
use crate::entities::{
    academic_sessions, classes, discounts, enrollments, outstanding_balances, payment_types,
    payments, receipts, students, terms,
};

/// Default number of receipt numbers tried before giving up.
pub const DEFAULT_RECEIPT_ATTEMPTS: u32 = 8;

/// Receipt to be issued for one payment.
#[derive(Debug, Clone, Copy)]
pub struct NewReceipt {
    /// Payer.
    pub student_id: Uuid,
    /// Payment the receipt covers.
    pub payment_id: Uuid,
    /// Discount applied to the payment's period.
    pub discount_id: Option<Uuid>,
    /// Balance left or created by the payment.
    pub outstanding_id: Option<Uuid>,
    /// Enrollment that gives the class context.
    pub enrollment_id: Option<Uuid>,
    /// Amount collected; equals the payment amount.
    pub amount_paid: Decimal,
}

/// Student section of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptStudent {
    /// Student ID.
    pub id: Uuid,
    /// Registration number.
    pub registration_number: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Gender.
    pub gender: String,
    /// Next of kin.
    pub next_of_kin_name: Option<String>,
    /// Next of kin phone number.
    pub next_of_kin_phone_number: Option<String>,
}

/// Term section of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptTerm {
    /// Term name.
    pub name: String,
    /// First day of the term.
    pub start_date: NaiveDate,
    /// Last day of the term.
    pub end_date: NaiveDate,
}

/// Payment section of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptPayment {
    /// Payment ID.
    pub id: Uuid,
    /// Fee category name.
    pub payment_type: String,
    /// Amount posted.
    pub amount: Decimal,
    /// Payment method.
    pub amount_type: String,
    /// When the payment was taken.
    pub payment_date: DateTimeWithTimeZone,
    /// False when the payment settled prior debt.
    pub regular_payment: bool,
    /// Session name of the period paid for.
    pub session: String,
    /// Term of the period paid for.
    pub term: ReceiptTerm,
}

/// Amount-bearing reference on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceiptAmount {
    /// Referenced record.
    pub id: Uuid,
    /// Its amount.
    pub amount: Decimal,
}

/// Class context of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptClass {
    /// Class name.
    pub class_name: String,
    /// Session of the enrollment.
    pub session: String,
    /// Term of the enrollment.
    pub term: String,
}

/// Receipt joined with everything printed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptData {
    /// Receipt ID.
    pub id: Uuid,
    /// Receipt number.
    pub receipt_number: String,
    /// Amount collected.
    pub amount_paid: Decimal,
    /// Payer.
    pub student: ReceiptStudent,
    /// Payment covered.
    pub payment: ReceiptPayment,
    /// Discount applied, if any.
    pub discount: Option<ReceiptAmount>,
    /// Outstanding balance, if any.
    pub outstanding_balance: Option<ReceiptAmount>,
    /// Class context, if known.
    pub class: Option<ReceiptClass>,
}

/// Receipt repository.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a receipt by number and composes its data.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptNotFound` if no receipt carries the number.
    pub async fn find_by_number(&self, receipt_number: &str) -> Result<ReceiptData, PaymentError> {
        let receipt = receipts::Entity::find()
            .filter(receipts::Column::ReceiptNumber.eq(receipt_number))
            .one(&self.db)
            .await?
            .ok_or_else(|| PaymentError::ReceiptNotFound(receipt_number.to_string()))?;
        compose_in(&self.db, receipt).await
    }

    /// Issues a receipt on an open transaction with freshly generated numbers.
    ///
    /// # Errors
    ///
    /// Same as [`issue_receipt_with`].
    pub async fn issue_in<C>(
        conn: &C,
        receipt: NewReceipt,
        attempts: u32,
    ) -> Result<receipts::Model, PaymentError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        issue_receipt_with(conn, receipt, attempts, ReceiptNumber::generate).await
    }
}

/// Issues a receipt, drawing candidate numbers from `next_number`.
///
/// A candidate already in the store is skipped before the insert; a
/// collision at insert time rolls back the savepoint and the next candidate
/// is tried.
///
/// # Errors
///
/// - `ReceiptNumberExhausted` after `attempts` candidates collided
/// - Database errors other than a unique violation
pub async fn issue_receipt_with<C, F>(
    conn: &C,
    receipt: NewReceipt,
    attempts: u32,
    mut next_number: F,
) -> Result<receipts::Model, PaymentError>
where
    C: ConnectionTrait + TransactionTrait,
    F: FnMut() -> ReceiptNumber,
{
    for _ in 0..attempts {
        let number = next_number();

        let taken = receipts::Entity::find()
            .filter(receipts::Column::ReceiptNumber.eq(number.as_str()))
            .one(conn)
            .await?;
        if taken.is_some() {
            warn!(receipt_number = %number, "Receipt number already issued, retrying");
            continue;
        }

        let savepoint = conn.begin().await?;
        let inserted = receipts::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_number: Set(number.as_str().to_string()),
            student_id: Set(receipt.student_id),
            payment_id: Set(receipt.payment_id),
            discount_id: Set(receipt.discount_id),
            outstanding_id: Set(receipt.outstanding_id),
            enrollment_id: Set(receipt.enrollment_id),
            amount_paid: Set(receipt.amount_paid),
            created_at: Set(Utc::now().into()),
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(model) => {
                savepoint.commit().await?;
                return Ok(model);
            }
            Err(e) if is_receipt_number_collision(&e) => {
                savepoint.rollback().await?;
                warn!(receipt_number = %number, "Receipt number collided on insert, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(BillingError::ReceiptNumberExhausted { attempts }.into())
}

fn is_receipt_number_collision(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => detail.contains("receipt_number"),
        _ => false,
    }
}

/// Loads everything a receipt prints and joins it into [`ReceiptData`].
///
/// # Errors
///
/// Returns a database error, or `NotFound` variants if a referenced row is gone.
pub async fn compose_in<C: ConnectionTrait>(
    conn: &C,
    receipt: receipts::Model,
) -> Result<ReceiptData, PaymentError> {
    let student = students::Entity::find_by_id(receipt.student_id)
        .one(conn)
        .await?
        .ok_or(PaymentError::StudentNotFound(receipt.student_id))?;

    let payment = payments::Entity::find_by_id(receipt.payment_id)
        .one(conn)
        .await?
        .ok_or(PaymentError::PaymentNotFound(receipt.payment_id))?;

    let payment_type = payment_types::Entity::find_by_id(payment.payment_type_id)
        .one(conn)
        .await?
        .ok_or(PaymentError::PaymentTypeNotFound(payment.payment_type_id))?;

    let session = session_name(conn, payment.session_id).await?;
    let term = terms::Entity::find_by_id(payment.term_id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("term {}", payment.term_id)))?;

    let discount = match receipt.discount_id {
        Some(id) => discounts::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|d| ReceiptAmount {
                id: d.id,
                amount: d.amount,
            }),
        None => None,
    };

    let outstanding_balance = match receipt.outstanding_id {
        Some(id) => outstanding_balances::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|o| ReceiptAmount {
                id: o.id,
                amount: o.amount,
            }),
        None => None,
    };

    let class = match receipt.enrollment_id {
        Some(id) => class_context(conn, id).await?,
        None => None,
    };

    Ok(ReceiptData {
        id: receipt.id,
        receipt_number: receipt.receipt_number,
        amount_paid: receipt.amount_paid,
        student: ReceiptStudent {
            id: student.id,
            registration_number: student.registration_number,
            first_name: student.first_name,
            last_name: student.last_name,
            gender: student.gender,
            next_of_kin_name: student.next_of_kin_name,
            next_of_kin_phone_number: student.next_of_kin_phone_number,
        },
        payment: ReceiptPayment {
            id: payment.id,
            payment_type: payment_type.name,
            amount: payment.amount,
            amount_type: payment.amount_type,
            payment_date: payment.payment_date,
            regular_payment: payment.regular_payment,
            session,
            term: ReceiptTerm {
                name: term.name,
                start_date: term.start_date,
                end_date: term.end_date,
            },
        },
        discount,
        outstanding_balance,
        class,
    })
}

async fn session_name<C: ConnectionTrait>(conn: &C, session_id: Uuid) -> Result<String, DbErr> {
    academic_sessions::Entity::find_by_id(session_id)
        .one(conn)
        .await?
        .map(|s| s.name)
        .ok_or_else(|| DbErr::RecordNotFound(format!("session {session_id}")))
}

async fn class_context<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: Uuid,
) -> Result<Option<ReceiptClass>, DbErr> {
    let Some(enrollment) = enrollments::Entity::find_by_id(enrollment_id).one(conn).await? else {
        return Ok(None);
    };

    let class_name = classes::Entity::find_by_id(enrollment.class_id)
        .one(conn)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    let session = session_name(conn, enrollment.session_id).await?;
    let term = terms::Entity::find_by_id(enrollment.term_id)
        .one(conn)
        .await?
        .map(|t| t.name)
        .unwrap_or_default();

    Ok(Some(ReceiptClass {
        class_name,
        session,
        term,
    }))
}
