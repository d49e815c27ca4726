//! Account repository for cash accounts and their payment type links.
//!
//! Balances only move through [`AccountRepository::credit`], which reads the
//! account under a row lock and writes the new balance in the same transaction.

use bursary_core::billing::{BillingError, credit_balance};
use bursary_shared::AppError;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    accounts, payment_type_accounts, payment_types, sea_orm_active_enums::AccountStatus,
};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account name already exists.
    #[error("Account '{0}' already exists")]
    NameTaken(String),

    /// Account name is blank.
    #[error("Account name is required")]
    MissingName,

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Payment type not found.
    #[error("Payment type not found: {0}")]
    PaymentTypeNotFound(Uuid),

    /// Payment type has no linked account.
    #[error("No account linked to payment type {0}")]
    LinkNotFound(Uuid),

    /// Payment type is already linked to an account.
    #[error("Payment type {0} is already linked to an account")]
    AlreadyLinked(Uuid),

    /// Billing rule violated.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::NameTaken(_) | AccountError::AlreadyLinked(_) => Self::Conflict(message),
            AccountError::MissingName => Self::Validation(message),
            AccountError::AccountNotFound(_)
            | AccountError::PaymentTypeNotFound(_)
            | AccountError::LinkNotFound(_) => Self::NotFound(message),
            AccountError::Billing(e) => e.into(),
            AccountError::Database(_) => Self::Database(message),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Default)]
pub struct CreateAccountInput {
    /// Unique account name.
    pub name: String,
    /// Person responsible for the account.
    pub owner: Option<String>,
    /// Free-form access notes.
    pub permissions: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Floor the balance should not drop below.
    pub minimum_balance: Decimal,
    /// Initial status; active when absent.
    pub status: Option<AccountStatus>,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or taken.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AccountError::MissingName);
        }

        let existing = accounts::Entity::find()
            .filter(accounts::Column::Name.eq(&name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountError::NameTaken(name));
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            owner: Set(input.owner),
            permissions: Set(input.permissions),
            notes: Set(input.notes),
            status: Set(input.status.unwrap_or(AccountStatus::Active)),
            balance: Set(Decimal::ZERO),
            minimum_balance: Set(input.minimum_balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(account_id = %account.id, name = %account.name, "Account created");
        Ok(account)
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn get_account(&self, id: Uuid) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::AccountNotFound(id))
    }

    /// Changes the status of an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.get_account(id).await?;
        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Links a payment type to the account its collections are credited to.
    ///
    /// # Errors
    ///
    /// Returns an error if either side does not exist or the payment type is
    /// already linked.
    pub async fn link_payment_type(
        &self,
        payment_type_id: Uuid,
        account_id: Uuid,
    ) -> Result<payment_type_accounts::Model, AccountError> {
        payment_types::Entity::find_by_id(payment_type_id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::PaymentTypeNotFound(payment_type_id))?;
        self.get_account(account_id).await?;

        let existing = payment_type_accounts::Entity::find()
            .filter(payment_type_accounts::Column::PaymentTypeId.eq(payment_type_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountError::AlreadyLinked(payment_type_id));
        }

        let link = payment_type_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            payment_type_id: Set(payment_type_id),
            account_id: Set(account_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(
            payment_type_id = %payment_type_id,
            account_id = %account_id,
            "Payment type linked to account"
        );
        Ok(link)
    }

    /// Credits the account linked to `payment_type_id` in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment type has no linked account
    /// - The account is not active
    /// - The amount is not positive
    pub async fn credit(
        &self,
        payment_type_id: Uuid,
        amount: Decimal,
    ) -> Result<accounts::Model, AccountError> {
        let txn = self.db.begin().await?;
        let account = Self::credit_in(&txn, payment_type_id, amount).await?;
        txn.commit().await?;
        Ok(account)
    }

    /// Credits the linked account on an open connection or transaction.
    ///
    /// The account row is read with `FOR UPDATE`; the caller owns the
    /// transaction boundary.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit`].
    pub async fn credit_in<C: ConnectionTrait>(
        conn: &C,
        payment_type_id: Uuid,
        amount: Decimal,
    ) -> Result<accounts::Model, AccountError> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(amount).into());
        }

        let link = Self::linked_account_in(conn, payment_type_id).await?;
        let account = accounts::Entity::find_by_id(link.account_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(AccountError::AccountNotFound(link.account_id))?;

        if account.status != AccountStatus::Active {
            return Err(BillingError::AccountNotActive(account.id).into());
        }

        let balance = credit_balance(account.balance, amount)?;
        let mut active: accounts::ActiveModel = account.into();
        active.balance = Set(balance);
        active.updated_at = Set(Utc::now().into());
        let account = active.update(conn).await?;

        info!(
            account_id = %account.id,
            amount = %amount,
            balance = %account.balance,
            "Account credited"
        );
        Ok(account)
    }

    /// Finds the link of a payment type to its account.
    ///
    /// # Errors
    ///
    /// Returns `LinkNotFound` if the payment type is not linked.
    pub async fn linked_account_in<C: ConnectionTrait>(
        conn: &C,
        payment_type_id: Uuid,
    ) -> Result<payment_type_accounts::Model, AccountError> {
        payment_type_accounts::Entity::find()
            .filter(payment_type_accounts::Column::PaymentTypeId.eq(payment_type_id))
            .one(conn)
            .await?
            .ok_or(AccountError::LinkNotFound(payment_type_id))
    }
}
