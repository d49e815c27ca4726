//! Calendar error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while resolving billing periods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// There is no later term in any later session.
    #[error("No more sessions available for payment")]
    NoFurtherPeriod,

    /// The period does not exist in the calendar.
    #[error("Unknown billing period: session {session_id}, term {term_id}")]
    UnknownPeriod {
        /// Session of the requested period.
        session_id: Uuid,
        /// Term of the requested period.
        term_id: Uuid,
    },

    /// The calendar has no terms at all.
    #[error("Academic calendar has no terms")]
    EmptyCalendar,
}

impl CalendarError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoFurtherPeriod => "no_further_period",
            Self::UnknownPeriod { .. } => "unknown_period",
            Self::EmptyCalendar => "empty_calendar",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoFurtherPeriod | Self::EmptyCalendar => 400,
            Self::UnknownPeriod { .. } => 404,
        }
    }
}
