//! Payment allocation and ledger-posting rules.
//!
//! This module holds the pure half of the payment workflow:
//! - Receipt number generation and verification
//! - Settlement of prior outstanding balances
//! - Forward allocation against the next period's fee
//! - Account credit rules
//! - Error types shared by the persistence layer

pub mod account;
pub mod allocation;
pub mod error;
pub mod receipt;
pub mod settlement;

#[cfg(test)]
mod allocation_props;

pub use account::credit_balance;
pub use allocation::{AllocationPlan, AllocationService, FeeAssessment, ForwardAllocation};
pub use error::BillingError;
pub use receipt::{ReceiptNumber, is_valid as is_valid_receipt_number, luhn_checksum};
pub use settlement::{BalanceAdjustment, OutstandingSnapshot, SettlementPlan};
