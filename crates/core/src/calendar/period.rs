//! Billing periods and the ordered academic calendar.

use bursary_shared::types::{AcademicSessionId, TermId};
use serde::{Deserialize, Serialize};

use super::error::CalendarError;

/// A billing period: one term of one academic session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Academic session.
    pub session_id: AcademicSessionId,
    /// Term within the session.
    pub term_id: TermId,
}

impl Period {
    /// Creates a period from its session and term.
    #[must_use]
    pub const fn new(session_id: AcademicSessionId, term_id: TermId) -> Self {
        Self {
            session_id,
            term_id,
        }
    }
}

/// Position of a period in calendar order.
///
/// Field order matters: the derived `Ord` compares the session ordinal first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodPosition {
    /// Ordinal of the session.
    pub session_ordinal: i32,
    /// Ordinal of the term within its session.
    pub term_ordinal: i32,
}

/// A term and its ordinal within the owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSlot {
    /// Term identifier.
    pub term_id: TermId,
    /// Ordinal within the session.
    pub ordinal: i32,
}

/// A session, its ordinal, and its terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlot {
    /// Session identifier.
    pub session_id: AcademicSessionId,
    /// Ordinal among all sessions.
    pub ordinal: i32,
    /// Terms of the session, any order.
    pub terms: Vec<TermSlot>,
}

/// Snapshot of every session and term, sorted by ordinal.
#[derive(Debug, Clone, Default)]
pub struct AcademicCalendar {
    sessions: Vec<SessionSlot>,
}

impl AcademicCalendar {
    /// Builds a calendar, sorting sessions and terms by ordinal.
    #[must_use]
    pub fn new(mut sessions: Vec<SessionSlot>) -> Self {
        sessions.sort_by_key(|s| s.ordinal);
        for session in &mut sessions {
            session.terms.sort_by_key(|t| t.ordinal);
        }
        Self { sessions }
    }

    /// Iterates every period in calendar order.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.sessions.iter().flat_map(|s| {
            s.terms
                .iter()
                .map(move |t| Period::new(s.session_id, t.term_id))
        })
    }

    fn locate(&self, period: Period) -> Result<(usize, usize), CalendarError> {
        let unknown = || CalendarError::UnknownPeriod {
            session_id: period.session_id.into_inner(),
            term_id: period.term_id.into_inner(),
        };

        let session_idx = self
            .sessions
            .iter()
            .position(|s| s.session_id == period.session_id)
            .ok_or_else(unknown)?;
        let term_idx = self.sessions[session_idx]
            .terms
            .iter()
            .position(|t| t.term_id == period.term_id)
            .ok_or_else(unknown)?;

        Ok((session_idx, term_idx))
    }

    /// Returns the ordinal position of a period.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPeriod` if the term does not belong to the session or
    /// either is missing from the calendar.
    pub fn position(&self, period: Period) -> Result<PeriodPosition, CalendarError> {
        let (session_idx, term_idx) = self.locate(period)?;
        let session = &self.sessions[session_idx];
        Ok(PeriodPosition {
            session_ordinal: session.ordinal,
            term_ordinal: session.terms[term_idx].ordinal,
        })
    }

    /// Resolves the period that follows `period`.
    ///
    /// The next term of the same session wins; otherwise the first term of
    /// the next session that has any terms.
    ///
    /// # Errors
    ///
    /// - `UnknownPeriod` if `period` is not in the calendar
    /// - `NoFurtherPeriod` if `period` is the last one
    pub fn next_after(&self, period: Period) -> Result<Period, CalendarError> {
        let (session_idx, term_idx) = self.locate(period)?;
        let session = &self.sessions[session_idx];

        if let Some(term) = session.terms.get(term_idx + 1) {
            return Ok(Period::new(session.session_id, term.term_id));
        }

        self.sessions[session_idx + 1..]
            .iter()
            .find_map(|s| {
                s.terms
                    .first()
                    .map(|t| Period::new(s.session_id, t.term_id))
            })
            .ok_or(CalendarError::NoFurtherPeriod)
    }

    /// Returns the first period of the calendar.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCalendar` if there are no terms.
    pub fn first_period(&self) -> Result<Period, CalendarError> {
        self.periods().next().ok_or(CalendarError::EmptyCalendar)
    }

    /// Returns the latest of the given periods, or `None` for an empty input.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPeriod` if any period is not in the calendar.
    pub fn latest<I>(&self, periods: I) -> Result<Option<Period>, CalendarError>
    where
        I: IntoIterator<Item = Period>,
    {
        self.extreme(periods, |candidate, best| candidate > best)
    }

    /// Returns the earliest of the given periods, or `None` for an empty input.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPeriod` if any period is not in the calendar.
    pub fn earliest<I>(&self, periods: I) -> Result<Option<Period>, CalendarError>
    where
        I: IntoIterator<Item = Period>,
    {
        self.extreme(periods, |candidate, best| candidate < best)
    }

    fn extreme<I, F>(&self, periods: I, better: F) -> Result<Option<Period>, CalendarError>
    where
        I: IntoIterator<Item = Period>,
        F: Fn(PeriodPosition, PeriodPosition) -> bool,
    {
        let mut best: Option<(PeriodPosition, Period)> = None;
        for period in periods {
            let position = self.position(period)?;
            match best {
                Some((best_position, _)) if !better(position, best_position) => {}
                _ => best = Some((position, period)),
            }
        }
        Ok(best.map(|(_, period)| period))
    }
}
