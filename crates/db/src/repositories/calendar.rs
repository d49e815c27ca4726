//! Academic calendar repository: sessions, terms, and classes.
//!
//! Sessions and terms get monotonically increasing ordinals on creation. All
//! period ordering goes through [`AcademicCalendar`] built from those ordinals.

use std::collections::HashMap;

use bursary_core::calendar::{AcademicCalendar, CalendarError, Period, SessionSlot, TermSlot};
use bursary_shared::AppError;
use bursary_shared::types::{AcademicSessionId, TermId};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{academic_sessions, classes, terms};

/// Error types for calendar operations.
#[derive(Debug, thiserror::Error)]
pub enum AcademicError {
    /// Session name already exists.
    #[error("Session '{0}' already exists")]
    DuplicateSession(String),

    /// Ordinal already used by another session or term.
    #[error("Ordinal {0} is already taken")]
    DuplicateOrdinal(i32),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Term name already exists in the session.
    #[error("Term '{0}' already exists in this session")]
    DuplicateTerm(String),

    /// Term not found.
    #[error("Term not found: {0}")]
    TermNotFound(Uuid),

    /// Term ends before it starts.
    #[error("Term end date {end} is before start date {start}")]
    InvalidTermDates {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Class name already exists.
    #[error("Class '{0}' already exists")]
    DuplicateClass(String),

    /// Name is blank.
    #[error("{0} name is required")]
    MissingName(&'static str),

    /// No ordinal is left after the highest one in use.
    #[error("No ordinal available after {0}")]
    OrdinalExhausted(i32),

    /// Period resolution failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AcademicError> for AppError {
    fn from(err: AcademicError) -> Self {
        let message = err.to_string();
        match err {
            AcademicError::DuplicateSession(_)
            | AcademicError::DuplicateOrdinal(_)
            | AcademicError::DuplicateTerm(_)
            | AcademicError::DuplicateClass(_) => Self::Conflict(message),
            AcademicError::SessionNotFound(_) | AcademicError::TermNotFound(_) => {
                Self::NotFound(message)
            }
            AcademicError::InvalidTermDates { .. }
            | AcademicError::MissingName(_)
            | AcademicError::OrdinalExhausted(_) => Self::Validation(message),
            AcademicError::Calendar(e) => bursary_core::billing::BillingError::from(e).into(),
            AcademicError::Database(_) => Self::Database(message),
        }
    }
}

/// Ordinal following the highest one in use, or 1 for the first entry.
fn next_ordinal(highest: Option<i32>) -> Result<i32, AcademicError> {
    match highest {
        None => Ok(1),
        Some(last) => last
            .checked_add(1)
            .ok_or(AcademicError::OrdinalExhausted(last)),
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    /// Session name (e.g., "2025/2026").
    pub name: String,
    /// Explicit ordinal; the next free one when absent.
    pub ordinal: Option<i32>,
}

/// Input for creating a term.
#[derive(Debug, Clone)]
pub struct CreateTermInput {
    /// Owning session.
    pub session_id: Uuid,
    /// Term name (e.g., "First Term").
    pub name: String,
    /// Explicit ordinal within the session; the next free one when absent.
    pub ordinal: Option<i32>,
    /// First day of the term.
    pub start_date: NaiveDate,
    /// Last day of the term.
    pub end_date: NaiveDate,
    /// Resumption date announced for the following term.
    pub next_term_date: Option<NaiveDate>,
}

/// Session with its terms in ordinal order.
#[derive(Debug, Clone)]
pub struct SessionWithTerms {
    /// The session record.
    pub session: academic_sessions::Model,
    /// Terms of the session.
    pub terms: Vec<terms::Model>,
}

/// Loads every session and term into an [`AcademicCalendar`].
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn load_calendar<C: ConnectionTrait>(conn: &C) -> Result<AcademicCalendar, DbErr> {
    let sessions = academic_sessions::Entity::find().all(conn).await?;
    let all_terms = terms::Entity::find().all(conn).await?;

    let mut by_session: HashMap<Uuid, Vec<TermSlot>> = HashMap::new();
    for term in all_terms {
        by_session.entry(term.session_id).or_default().push(TermSlot {
            term_id: TermId::from_uuid(term.id),
            ordinal: term.ordinal,
        });
    }

    let slots = sessions
        .into_iter()
        .map(|s| SessionSlot {
            session_id: AcademicSessionId::from_uuid(s.id),
            ordinal: s.ordinal,
            terms: by_session.remove(&s.id).unwrap_or_default(),
        })
        .collect();

    Ok(AcademicCalendar::new(slots))
}

/// Builds a period from raw column values.
#[must_use]
pub fn period_of(session_id: Uuid, term_id: Uuid) -> Period {
    Period::new(
        AcademicSessionId::from_uuid(session_id),
        TermId::from_uuid(term_id),
    )
}

/// Repository for the academic calendar.
#[derive(Debug, Clone)]
pub struct CalendarRepository {
    db: DatabaseConnection,
}

impl CalendarRepository {
    /// Creates a new calendar repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a session, assigning the next ordinal when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or ordinal is taken.
    pub async fn create_session(
        &self,
        input: CreateSessionInput,
    ) -> Result<academic_sessions::Model, AcademicError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AcademicError::MissingName("Session"));
        }

        let existing = academic_sessions::Entity::find()
            .filter(academic_sessions::Column::Name.eq(&name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AcademicError::DuplicateSession(name));
        }

        let ordinal = match input.ordinal {
            Some(ordinal) => {
                let taken = academic_sessions::Entity::find()
                    .filter(academic_sessions::Column::Ordinal.eq(ordinal))
                    .one(&self.db)
                    .await?;
                if taken.is_some() {
                    return Err(AcademicError::DuplicateOrdinal(ordinal));
                }
                ordinal
            }
            None => {
                let last = academic_sessions::Entity::find()
                    .order_by_desc(academic_sessions::Column::Ordinal)
                    .one(&self.db)
                    .await?
                    .map(|s| s.ordinal);
                next_ordinal(last)?
            }
        };

        let session = academic_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            ordinal: Set(ordinal),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(session)
    }

    /// Lists sessions with their terms, in calendar order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_sessions(&self) -> Result<Vec<SessionWithTerms>, AcademicError> {
        let sessions = academic_sessions::Entity::find()
            .order_by_asc(academic_sessions::Column::Ordinal)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(sessions.len());
        for session in sessions {
            let terms = terms::Entity::find()
                .filter(terms::Column::SessionId.eq(session.id))
                .order_by_asc(terms::Column::Ordinal)
                .all(&self.db)
                .await?;
            result.push(SessionWithTerms { session, terms });
        }

        Ok(result)
    }

    /// Creates a term inside a session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session does not exist
    /// - The dates are inverted
    /// - The name or ordinal is taken within the session
    pub async fn create_term(&self, input: CreateTermInput) -> Result<terms::Model, AcademicError> {
        if input.end_date < input.start_date {
            return Err(AcademicError::InvalidTermDates {
                start: input.start_date,
                end: input.end_date,
            });
        }

        academic_sessions::Entity::find_by_id(input.session_id)
            .one(&self.db)
            .await?
            .ok_or(AcademicError::SessionNotFound(input.session_id))?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AcademicError::MissingName("Term"));
        }
        let siblings = terms::Entity::find()
            .filter(terms::Column::SessionId.eq(input.session_id))
            .all(&self.db)
            .await?;

        if siblings.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
            return Err(AcademicError::DuplicateTerm(name));
        }

        let ordinal = match input.ordinal {
            Some(ordinal) if siblings.iter().any(|t| t.ordinal == ordinal) => {
                return Err(AcademicError::DuplicateOrdinal(ordinal));
            }
            Some(ordinal) => ordinal,
            None => next_ordinal(siblings.iter().map(|t| t.ordinal).max())?,
        };

        let term = terms::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(input.session_id),
            name: Set(name),
            ordinal: Set(ordinal),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            next_term_date: Set(input.next_term_date),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(term)
    }

    /// Creates a class.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub async fn create_class(&self, name: &str) -> Result<classes::Model, AcademicError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AcademicError::MissingName("Class"));
        }

        let existing = classes::Entity::find()
            .filter(classes::Column::Name.eq(&name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AcademicError::DuplicateClass(name));
        }

        let class = classes::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(class)
    }

    /// Loads the full calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn calendar(&self) -> Result<AcademicCalendar, AcademicError> {
        Ok(load_calendar(&self.db).await?)
    }

    /// Resolves the billing period that follows `(session_id, term_id)`.
    ///
    /// # Errors
    ///
    /// - `Calendar(UnknownPeriod)` if the pair is not in the calendar
    /// - `Calendar(NoFurtherPeriod)` if it is the last period
    pub async fn resolve_next_period(
        &self,
        session_id: Uuid,
        term_id: Uuid,
    ) -> Result<Period, AcademicError> {
        let calendar = self.calendar().await?;
        Ok(calendar.next_after(period_of(session_id, term_id))?)
    }
}
