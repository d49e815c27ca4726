//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//!
//! Functions suffixed `_in` take any connection or open transaction so that
//! several repositories can write inside one transaction.

pub mod account;
pub mod calendar;
pub mod outstanding;
pub mod payment;
pub mod payment_type;
pub mod receipt;
pub mod student;

pub use account::{AccountError, AccountRepository, CreateAccountInput};
pub use calendar::{
    AcademicError, CalendarRepository, CreateSessionInput, CreateTermInput, SessionWithTerms,
};
pub use outstanding::{BalanceKey, OutstandingBalanceRepository, SettleError};
pub use payment::{PaymentError, PaymentRepository, ProcessPaymentInput};
pub use payment_type::{CreateDiscountInput, PaymentTypeError, PaymentTypeRepository};
pub use receipt::{NewReceipt, ReceiptData, ReceiptRepository};
pub use student::{CreateStudentInput, EnrollStudentInput, StudentError, StudentRepository};
