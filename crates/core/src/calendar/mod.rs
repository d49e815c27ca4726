//! Academic calendar ordering and period resolution.
//!
//! Sessions and terms carry explicit ordinals. A billing period is a
//! (session, term) pair and the successor of a period is found by comparing
//! ordinals, never by comparing ids.

pub mod error;
pub mod period;

#[cfg(test)]
mod period_props;

pub use error::CalendarError;
pub use period::{AcademicCalendar, Period, PeriodPosition, SessionSlot, TermSlot};
