//! Payment repository: allocation and ledger posting of incoming payments.
//!
//! One call to [`PaymentRepository::process_payment`] runs in a single outer
//! transaction. Prior debt is settled first, then whatever is left pays the
//! fee of the next billing period. Each of the two branches runs in its own
//! savepoint and posts a payment, a receipt, a transaction record, and an
//! account credit.

use bursary_core::billing::{AllocationService, BillingError, FeeAssessment, SettlementPlan};
use bursary_core::calendar::{AcademicCalendar, CalendarError, Period};
use bursary_shared::AppError;
use bursary_shared::types::OutstandingBalanceId;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::account::{AccountError, AccountRepository};
use super::calendar::{load_calendar, period_of};
use super::outstanding::{BalanceKey, OutstandingBalanceRepository, snapshots};
use super::receipt::{
    DEFAULT_RECEIPT_ATTEMPTS, NewReceipt, ReceiptData, ReceiptRepository, compose_in,
};
use crate::entities::{
    accounts, discounts, enrollments, outstanding_balances, payment_types, payments, receipts,
    sea_orm_active_enums::{AccountStatus, TransactionStatus, TransactionType},
    students, transactions,
};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Student not found.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Payment type not found.
    #[error("Payment type not found: {0}")]
    PaymentTypeNotFound(Uuid),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// Student has no enrollment to anchor billing on.
    #[error("Student {0} has no enrollment")]
    NoEnrollment(Uuid),

    /// Billing rule violated.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Account lookup or credit failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CalendarError> for PaymentError {
    fn from(err: CalendarError) -> Self {
        Self::Billing(err.into())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::StudentNotFound(_)
            | PaymentError::PaymentTypeNotFound(_)
            | PaymentError::PaymentNotFound(_)
            | PaymentError::ReceiptNotFound(_)
            | PaymentError::NoEnrollment(_) => Self::NotFound(message),
            PaymentError::Billing(e) => e.into(),
            PaymentError::Account(e) => e.into(),
            PaymentError::Database(_) => Self::Database(message),
        }
    }
}

/// Input for processing an incoming payment.
#[derive(Debug, Clone)]
pub struct ProcessPaymentInput {
    /// Payer.
    pub student_id: Uuid,
    /// Fee category paid for.
    pub payment_type_id: Uuid,
    /// Amount received.
    pub amount: Decimal,
    /// Payment method (e.g., "cash", "transfer").
    pub amount_type: String,
}

/// Facts shared by every record posted for one incoming payment.
struct PostingContext {
    student_id: Uuid,
    payment_type_id: Uuid,
    account_id: Uuid,
    amount_type: String,
    enrollment_id: Option<Uuid>,
    payment_date: DateTimeWithTimeZone,
}

/// One money movement: a payment row and everything that mirrors it.
struct Movement {
    period: Period,
    amount: Decimal,
    regular: bool,
    discount_id: Option<Uuid>,
    outstanding_id: Option<Uuid>,
    description: String,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    receipt_attempts: u32,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            receipt_attempts: DEFAULT_RECEIPT_ATTEMPTS,
        }
    }

    /// Sets how many receipt numbers are tried per receipt.
    #[must_use]
    pub const fn with_receipt_attempts(mut self, attempts: u32) -> Self {
        self.receipt_attempts = attempts;
        self
    }

    /// Allocates an incoming payment and returns one receipt per movement.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive or the amount type is invalid
    /// - The student, payment type, or account link does not exist
    /// - The student has no enrollment
    /// - The linked account is not active
    /// - No period follows the last one paid
    /// - The amount exceeds prior debt plus the next period's fee
    ///
    /// Nothing is written when an error is returned.
    pub async fn process_payment(
        &self,
        input: ProcessPaymentInput,
    ) -> Result<Vec<ReceiptData>, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(input.amount).into());
        }
        AllocationService::validate_amount_type(&input.amount_type)?;

        let txn = self.db.begin().await?;

        // Serializes payments for one student: the target period is derived
        // from rows read below and must not move until commit.
        let student = students::Entity::find_by_id(input.student_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::StudentNotFound(input.student_id))?;

        let payment_type = payment_types::Entity::find_by_id(input.payment_type_id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::PaymentTypeNotFound(input.payment_type_id))?;

        let link = AccountRepository::linked_account_in(&txn, payment_type.id).await?;
        let account = accounts::Entity::find_by_id(link.account_id)
            .one(&txn)
            .await?
            .ok_or(AccountError::AccountNotFound(link.account_id))?;
        if account.status != AccountStatus::Active {
            return Err(BillingError::AccountNotActive(account.id).into());
        }

        let calendar = load_calendar(&txn).await?;

        let student_enrollments = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student.id))
            .all(&txn)
            .await?;
        let enrollment_periods = student_enrollments
            .iter()
            .map(|e| period_of(e.session_id, e.term_id));
        let Some(first_enrolled) = calendar.earliest(enrollment_periods.clone())? else {
            return Err(PaymentError::NoEnrollment(student.id));
        };
        let current_enrollment = calendar
            .latest(enrollment_periods)?
            .and_then(|period| {
                student_enrollments
                    .iter()
                    .find(|e| period_of(e.session_id, e.term_id) == period)
            })
            .map(|e| e.id);

        let last_paid = last_paid_period(&txn, &calendar, student.id, payment_type.id).await?;

        let key = BalanceKey {
            student_id: student.id,
            payment_type_id: payment_type.id,
        };
        let balances = OutstandingBalanceRepository::lock_open_in(&txn, key).await?;
        let settlement = SettlementPlan::compute(&snapshots(&balances), input.amount)?;

        let (target, fee, discount_id) = if settlement.remaining > Decimal::ZERO {
            let mut target = match last_paid {
                Some(period) => calendar.next_after(period)?,
                None => first_enrolled,
            };
            let mut discount = find_discount(&txn, key, target).await?;
            let mut fee = assess(payment_type.amount, discount.as_ref());
            // Fully waived periods take no payment; bill the next one instead.
            while fee.is_waived() {
                debug!(
                    student_id = %student.id,
                    session_id = %target.session_id,
                    term_id = %target.term_id,
                    "Fee waived for period, skipping"
                );
                target = calendar.next_after(target)?;
                discount = find_discount(&txn, key, target).await?;
                fee = assess(payment_type.amount, discount.as_ref());
            }
            (Some(target), Some(fee), discount.map(|d| d.id))
        } else {
            (None, None, None)
        };

        let plan = AllocationService::plan(settlement, fee)?;
        debug!(
            student_id = %student.id,
            deducted = %plan.settlement.deducted,
            forward = %plan.forward.map_or(Decimal::ZERO, |f| f.paid),
            carried_forward = %plan.new_outstanding(),
            "Payment allocation planned"
        );

        let ctx = PostingContext {
            student_id: student.id,
            payment_type_id: payment_type.id,
            account_id: account.id,
            amount_type: input.amount_type.trim().to_string(),
            enrollment_id: current_enrollment,
            payment_date: Utc::now().into(),
        };

        let mut issued = Vec::with_capacity(2);

        if plan.settlement.has_deduction() {
            let debt_period = settled_period(&balances, &plan.settlement)
                .or(last_paid)
                .unwrap_or(first_enrolled);

            let branch = txn.begin().await?;
            OutstandingBalanceRepository::apply_in(&branch, &plan.settlement).await?;
            let receipt = self
                .post_movement_in(
                    &branch,
                    &ctx,
                    Movement {
                        period: debt_period,
                        amount: plan.settlement.deducted,
                        regular: false,
                        discount_id: None,
                        outstanding_id: plan
                            .settlement
                            .surviving_balance_id()
                            .map(OutstandingBalanceId::into_inner),
                        description: format!("Outstanding {} settlement", payment_type.name),
                    },
                )
                .await?;
            branch.commit().await?;
            issued.push(receipt);
        }

        if let (Some(forward), Some(target)) = (plan.forward, target) {
            let branch = txn.begin().await?;
            let outstanding_id = if forward.has_shortfall() {
                let balance = OutstandingBalanceRepository::create_in(
                    &branch,
                    key,
                    target,
                    forward.carried_forward,
                )
                .await?;
                Some(balance.id)
            } else {
                None
            };
            let receipt = self
                .post_movement_in(
                    &branch,
                    &ctx,
                    Movement {
                        period: target,
                        amount: forward.paid,
                        regular: true,
                        discount_id,
                        outstanding_id,
                        description: format!("{} payment", payment_type.name),
                    },
                )
                .await?;
            branch.commit().await?;
            issued.push(receipt);
        }

        let mut receipt_data = Vec::with_capacity(issued.len());
        for receipt in issued {
            receipt_data.push(compose_in(&txn, receipt).await?);
        }

        txn.commit().await?;

        info!(
            student_id = %student.id,
            payment_type_id = %payment_type.id,
            amount = %input.amount,
            receipts = receipt_data.len(),
            carried_forward = %plan.new_outstanding(),
            "Payment processed"
        );

        Ok(receipt_data)
    }

    /// Gets a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if the payment does not exist.
    pub async fn get_payment(&self, id: Uuid) -> Result<payments::Model, PaymentError> {
        payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::PaymentNotFound(id))
    }

    /// Inserts the payment, its receipt, and its transaction record, then
    /// credits the linked account.
    async fn post_movement_in<C>(
        &self,
        conn: &C,
        ctx: &PostingContext,
        movement: Movement,
    ) -> Result<receipts::Model, PaymentError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let payment = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(ctx.student_id),
            payment_type_id: Set(ctx.payment_type_id),
            session_id: Set(movement.period.session_id.into_inner()),
            term_id: Set(movement.period.term_id.into_inner()),
            amount: Set(movement.amount),
            amount_type: Set(ctx.amount_type.clone()),
            payment_date: Set(ctx.payment_date),
            regular_payment: Set(movement.regular),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        let receipt = ReceiptRepository::issue_in(
            conn,
            NewReceipt {
                student_id: ctx.student_id,
                payment_id: payment.id,
                discount_id: movement.discount_id,
                outstanding_id: movement.outstanding_id,
                enrollment_id: ctx.enrollment_id,
                amount_paid: payment.amount,
            },
            self.receipt_attempts,
        )
        .await?;

        transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt.id),
            payment_type_id: Set(ctx.payment_type_id),
            student_id: Set(ctx.student_id),
            account_id: Set(ctx.account_id),
            discount_id: Set(movement.discount_id),
            amount: Set(payment.amount),
            transaction_type: Set(TransactionType::Income),
            status: Set(TransactionStatus::Completed),
            payment_method: Set(ctx.amount_type.clone()),
            description: Set(movement.description),
            transaction_date: Set(ctx.payment_date),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        AccountRepository::credit_in(conn, ctx.payment_type_id, payment.amount).await?;

        debug!(
            payment_id = %payment.id,
            receipt_number = %receipt.receipt_number,
            amount = %payment.amount,
            regular = payment.regular_payment,
            "Movement posted"
        );

        Ok(receipt)
    }
}

/// Latest period, by calendar order, among the student's payments for a fee.
async fn last_paid_period<C: ConnectionTrait>(
    conn: &C,
    calendar: &AcademicCalendar,
    student_id: Uuid,
    payment_type_id: Uuid,
) -> Result<Option<Period>, PaymentError> {
    let paid = payments::Entity::find()
        .filter(payments::Column::StudentId.eq(student_id))
        .filter(payments::Column::PaymentTypeId.eq(payment_type_id))
        .all(conn)
        .await?;

    Ok(calendar.latest(paid.iter().map(|p| period_of(p.session_id, p.term_id)))?)
}

fn assess(fee: Decimal, discount: Option<&discounts::Model>) -> FeeAssessment {
    FeeAssessment {
        fee,
        discount: discount.map_or(Decimal::ZERO, |d| d.amount),
    }
}

async fn find_discount<C: ConnectionTrait>(
    conn: &C,
    key: BalanceKey,
    period: Period,
) -> Result<Option<discounts::Model>, DbErr> {
    discounts::Entity::find()
        .filter(discounts::Column::StudentId.eq(key.student_id))
        .filter(discounts::Column::PaymentTypeId.eq(key.payment_type_id))
        .filter(discounts::Column::SessionId.eq(period.session_id.into_inner()))
        .filter(discounts::Column::TermId.eq(period.term_id.into_inner()))
        .one(conn)
        .await
}

/// Period of the oldest balance the plan paid into.
fn settled_period(
    balances: &[outstanding_balances::Model],
    settlement: &SettlementPlan,
) -> Option<Period> {
    let id = settlement
        .adjustments
        .iter()
        .find(|adj| adj.consumed() > Decimal::ZERO)?
        .id()
        .into_inner();
    balances
        .iter()
        .find(|b| b.id == id)
        .map(|b| period_of(b.session_id, b.term_id))
}
