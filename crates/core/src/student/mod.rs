//! Student registration rules.

pub mod registration;

pub use registration::{RegistrationError, RegistrationNumber, normalize_name};
