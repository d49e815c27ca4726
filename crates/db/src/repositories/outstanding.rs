//! Outstanding balance repository.

use bursary_core::billing::{BalanceAdjustment, BillingError, OutstandingSnapshot, SettlementPlan};
use bursary_core::calendar::Period;
use bursary_shared::AppError;
use bursary_shared::types::OutstandingBalanceId;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::outstanding_balances;

/// Owner of a group of balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceKey {
    /// Student owing the balance.
    pub student_id: Uuid,
    /// Fee category.
    pub payment_type_id: Uuid,
}

/// Repository for outstanding balances.
#[derive(Debug, Clone)]
pub struct OutstandingBalanceRepository {
    db: DatabaseConnection,
}

impl OutstandingBalanceRepository {
    /// Creates a new outstanding balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the open balances of a student for one payment type, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_open(&self, key: BalanceKey) -> Result<Vec<outstanding_balances::Model>, DbErr> {
        open_balances(key).all(&self.db).await
    }

    /// Settles `amount` against the open balances in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a non-positive amount, or a database error.
    pub async fn settle(
        &self,
        key: BalanceKey,
        amount: Decimal,
    ) -> Result<SettlementPlan, SettleError> {
        let txn = self.db.begin().await?;
        let plan = Self::settle_in(&txn, key, amount).await?;
        txn.commit().await?;
        Ok(plan)
    }

    /// Locks the open balances, plans the settlement, and applies it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::settle`].
    pub async fn settle_in<C: ConnectionTrait>(
        conn: &C,
        key: BalanceKey,
        amount: Decimal,
    ) -> Result<SettlementPlan, SettleError> {
        let balances = Self::lock_open_in(conn, key).await?;
        let plan = SettlementPlan::compute(&snapshots(&balances), amount)?;
        Self::apply_in(conn, &plan).await?;
        Ok(plan)
    }

    /// Reads the open balances with `FOR UPDATE`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn lock_open_in<C: ConnectionTrait>(
        conn: &C,
        key: BalanceKey,
    ) -> Result<Vec<outstanding_balances::Model>, DbErr> {
        open_balances(key).lock_exclusive().all(conn).await
    }

    /// Writes a settlement plan: cleared rows are deleted, reduced rows updated.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub async fn apply_in<C: ConnectionTrait>(conn: &C, plan: &SettlementPlan) -> Result<(), DbErr> {
        for adjustment in &plan.adjustments {
            match *adjustment {
                BalanceAdjustment::Clear { id, amount } => {
                    outstanding_balances::Entity::delete_by_id(id.into_inner())
                        .exec(conn)
                        .await?;
                    debug!(outstanding_id = %id, amount = %amount, "Outstanding balance cleared");
                }
                BalanceAdjustment::Reduce { id, amount, left } => {
                    outstanding_balances::ActiveModel {
                        id: Set(id.into_inner()),
                        amount: Set(left),
                        updated_at: Set(Utc::now().into()),
                        ..Default::default()
                    }
                    .update(conn)
                    .await?;
                    debug!(
                        outstanding_id = %id,
                        amount = %amount,
                        left = %left,
                        "Outstanding balance reduced"
                    );
                }
            }
        }
        Ok(())
    }

    /// Records the unpaid part of a period's fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        key: BalanceKey,
        period: Period,
        amount: Decimal,
    ) -> Result<outstanding_balances::Model, DbErr> {
        let now = Utc::now().into();
        outstanding_balances::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(key.student_id),
            payment_type_id: Set(key.payment_type_id),
            session_id: Set(period.session_id.into_inner()),
            term_id: Set(period.term_id.into_inner()),
            amount: Set(amount),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }
}

/// Error raised by a standalone settlement.
#[derive(Debug, thiserror::Error)]
pub enum SettleError {
    /// Billing rule violated.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SettleError> for AppError {
    fn from(err: SettleError) -> Self {
        match err {
            SettleError::Billing(e) => e.into(),
            SettleError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Converts rows into the view the settlement planner works on.
#[must_use]
pub fn snapshots(balances: &[outstanding_balances::Model]) -> Vec<OutstandingSnapshot> {
    balances
        .iter()
        .map(|b| OutstandingSnapshot {
            id: OutstandingBalanceId::from_uuid(b.id),
            amount: b.amount,
        })
        .collect()
}

fn open_balances(key: BalanceKey) -> sea_orm::Select<outstanding_balances::Entity> {
    outstanding_balances::Entity::find()
        .filter(outstanding_balances::Column::StudentId.eq(key.student_id))
        .filter(outstanding_balances::Column::PaymentTypeId.eq(key.payment_type_id))
        .order_by_asc(outstanding_balances::Column::CreatedAt)
        .order_by_asc(outstanding_balances::Column::Id)
}
