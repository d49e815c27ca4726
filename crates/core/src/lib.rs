//! Core business logic for Bursary.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `billing` - Payment allocation, settlement, and receipt numbering
//! - `calendar` - Academic session/term ordering and period resolution
//! - `student` - Registration number rules

pub mod billing;
pub mod calendar;
pub mod student;
