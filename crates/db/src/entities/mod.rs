//! `SeaORM` entity definitions.

pub mod academic_sessions;
pub mod accounts;
pub mod classes;
pub mod discounts;
pub mod enrollments;
pub mod outstanding_balances;
pub mod payment_type_accounts;
pub mod payment_types;
pub mod payments;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod students;
pub mod terms;
pub mod transactions;
