//! Payment type and discount repository.

use bursary_shared::AppError;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{discounts, payment_types, students, terms};

/// Error types for payment type and discount operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentTypeError {
    /// Payment type name already exists.
    #[error("Payment type '{0}' already exists")]
    DuplicateName(String),

    /// Payment type not found.
    #[error("Payment type not found: {0}")]
    NotFound(Uuid),

    /// Amount must be positive.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// Name is blank.
    #[error("Name is required")]
    MissingName,

    /// Student not found.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Term not found in the given session.
    #[error("Term {term_id} not found in session {session_id}")]
    PeriodNotFound {
        /// Session.
        session_id: Uuid,
        /// Term.
        term_id: Uuid,
    },

    /// Discount already exists for this student, fee, and period.
    #[error("Discount already exists for this student, payment type, session, and term")]
    DuplicateDiscount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentTypeError> for AppError {
    fn from(err: PaymentTypeError) -> Self {
        let message = err.to_string();
        match err {
            PaymentTypeError::DuplicateName(_) | PaymentTypeError::DuplicateDiscount => {
                Self::Conflict(message)
            }
            PaymentTypeError::NotFound(_)
            | PaymentTypeError::StudentNotFound(_)
            | PaymentTypeError::PeriodNotFound { .. } => Self::NotFound(message),
            PaymentTypeError::InvalidAmount(_) | PaymentTypeError::MissingName => {
                Self::Validation(message)
            }
            PaymentTypeError::Database(_) => Self::Database(message),
        }
    }
}

/// Input for creating a discount.
#[derive(Debug, Clone)]
pub struct CreateDiscountInput {
    /// Student receiving the discount.
    pub student_id: Uuid,
    /// Fee category discounted.
    pub payment_type_id: Uuid,
    /// Session of the discounted period.
    pub session_id: Uuid,
    /// Term of the discounted period.
    pub term_id: Uuid,
    /// Amount taken off the fee.
    pub amount: Decimal,
    /// Reason shown on statements.
    pub reason: Option<String>,
}

/// Repository for payment types and discounts.
#[derive(Debug, Clone)]
pub struct PaymentTypeRepository {
    db: DatabaseConnection,
}

impl PaymentTypeRepository {
    /// Creates a new payment type repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a payment type.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or taken, or the amount is not positive.
    pub async fn create_payment_type(
        &self,
        name: &str,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<payment_types::Model, PaymentTypeError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(PaymentTypeError::MissingName);
        }
        if amount <= Decimal::ZERO {
            return Err(PaymentTypeError::InvalidAmount(amount));
        }

        let existing = payment_types::Entity::find()
            .filter(payment_types::Column::Name.eq(&name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(PaymentTypeError::DuplicateName(name));
        }

        let payment_type = payment_types::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            amount: Set(amount),
            description: Set(description),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(payment_type_id = %payment_type.id, amount = %amount, "Payment type created");
        Ok(payment_type)
    }

    /// Gets a payment type by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn get_payment_type(&self, id: Uuid) -> Result<payment_types::Model, PaymentTypeError> {
        payment_types::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentTypeError::NotFound(id))
    }

    /// Lists payment types by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_payment_types(&self) -> Result<Vec<payment_types::Model>, PaymentTypeError> {
        Ok(payment_types::Entity::find()
            .order_by_asc(payment_types::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Grants a discount for one student, fee category, and period.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive
    /// - The student, payment type, or period does not exist
    /// - A discount already exists for the same combination
    pub async fn create_discount(
        &self,
        input: CreateDiscountInput,
    ) -> Result<discounts::Model, PaymentTypeError> {
        if input.amount <= Decimal::ZERO {
            return Err(PaymentTypeError::InvalidAmount(input.amount));
        }

        students::Entity::find_by_id(input.student_id)
            .one(&self.db)
            .await?
            .ok_or(PaymentTypeError::StudentNotFound(input.student_id))?;

        self.get_payment_type(input.payment_type_id).await?;

        let term = terms::Entity::find_by_id(input.term_id)
            .one(&self.db)
            .await?
            .filter(|t| t.session_id == input.session_id);
        if term.is_none() {
            return Err(PaymentTypeError::PeriodNotFound {
                session_id: input.session_id,
                term_id: input.term_id,
            });
        }

        let existing = discounts::Entity::find()
            .filter(discounts::Column::StudentId.eq(input.student_id))
            .filter(discounts::Column::PaymentTypeId.eq(input.payment_type_id))
            .filter(discounts::Column::SessionId.eq(input.session_id))
            .filter(discounts::Column::TermId.eq(input.term_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(PaymentTypeError::DuplicateDiscount);
        }

        let discount = discounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(input.student_id),
            payment_type_id: Set(input.payment_type_id),
            session_id: Set(input.session_id),
            term_id: Set(input.term_id),
            amount: Set(input.amount),
            reason: Set(input.reason),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(
            discount_id = %discount.id,
            student_id = %discount.student_id,
            amount = %discount.amount,
            "Discount granted"
        );
        Ok(discount)
    }
}
