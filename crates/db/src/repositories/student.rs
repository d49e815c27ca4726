//! Student repository: registration and enrollment.

use bursary_core::student::{RegistrationError, RegistrationNumber, normalize_name};
use bursary_shared::AppError;
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{academic_sessions, classes, enrollments, students, terms};

/// Registration number collisions tolerated before giving up.
const REGISTRATION_ATTEMPTS: u32 = 5;

/// Error types for student operations.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    /// A student with the same name and date of birth exists.
    #[error("Student {first_name} {last_name} born {date_of_birth} already exists")]
    DuplicateStudent {
        /// First name.
        first_name: String,
        /// Last name.
        last_name: String,
        /// Date of birth.
        date_of_birth: NaiveDate,
    },

    /// Student not found.
    #[error("Student not found: {0}")]
    NotFound(Uuid),

    /// Class not found.
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Term not found.
    #[error("Term not found: {0}")]
    TermNotFound(Uuid),

    /// Term belongs to another session.
    #[error("Term {term_id} does not belong to session {session_id}")]
    TermSessionMismatch {
        /// Term.
        term_id: Uuid,
        /// Session given.
        session_id: Uuid,
    },

    /// Student is already enrolled for the period in this class.
    #[error("Student is already enrolled in this class for the given term")]
    DuplicateEnrollment,

    /// Required field missing.
    #[error("Invalid student data: {0}")]
    Invalid(String),

    /// Registration number could not be built.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Every candidate registration number was taken.
    #[error("Could not allocate a registration number")]
    RegistrationExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StudentError> for AppError {
    fn from(err: StudentError) -> Self {
        let message = err.to_string();
        match err {
            StudentError::DuplicateStudent { .. } | StudentError::DuplicateEnrollment => {
                Self::Conflict(message)
            }
            StudentError::NotFound(_)
            | StudentError::ClassNotFound(_)
            | StudentError::SessionNotFound(_)
            | StudentError::TermNotFound(_) => Self::NotFound(message),
            StudentError::TermSessionMismatch { .. }
            | StudentError::Invalid(_)
            | StudentError::Registration(_) => Self::Validation(message),
            StudentError::RegistrationExhausted => Self::Internal(message),
            StudentError::Database(_) => Self::Database(message),
        }
    }
}

/// Input for registering a student.
#[derive(Debug, Clone)]
pub struct CreateStudentInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Middle or other names.
    pub other_names: Option<String>,
    /// Gender.
    pub gender: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Home address.
    pub address: Option<String>,
    /// Next of kin.
    pub next_of_kin_name: Option<String>,
    /// Next of kin phone number.
    pub next_of_kin_phone_number: Option<String>,
    /// Registration year; the current year when absent.
    pub registration_year: Option<i32>,
}

/// Input for enrolling a student.
#[derive(Debug, Clone, Copy)]
pub struct EnrollStudentInput {
    /// Student.
    pub student_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Session.
    pub session_id: Uuid,
    /// Term within the session.
    pub term_id: Uuid,
}

/// Student repository.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    db: DatabaseConnection,
    registration_prefix: String,
}

impl StudentRepository {
    /// Creates a new student repository issuing numbers with `registration_prefix`.
    #[must_use]
    pub fn new(db: DatabaseConnection, registration_prefix: impl Into<String>) -> Self {
        Self {
            db,
            registration_prefix: registration_prefix.into(),
        }
    }

    /// Registers a student and assigns a registration number.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Names or gender are blank
    /// - A student with the same name and date of birth exists
    /// - No free registration number could be found
    pub async fn create_student(
        &self,
        input: CreateStudentInput,
    ) -> Result<students::Model, StudentError> {
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(StudentError::Invalid(
                "first and last name are required".to_string(),
            ));
        }
        if input.gender.trim().is_empty() {
            return Err(StudentError::Invalid("gender is required".to_string()));
        }

        let same_birthday = students::Entity::find()
            .filter(students::Column::DateOfBirth.eq(input.date_of_birth))
            .all(&self.db)
            .await?;
        let (first_key, last_key) = (normalize_name(&first_name), normalize_name(&last_name));
        if same_birthday.iter().any(|s| {
            normalize_name(&s.first_name) == first_key && normalize_name(&s.last_name) == last_key
        }) {
            return Err(StudentError::DuplicateStudent {
                first_name,
                last_name,
                date_of_birth: input.date_of_birth,
            });
        }

        let year = input.registration_year.unwrap_or_else(|| Utc::now().year());
        let registered = students::Entity::find()
            .filter(students::Column::RegistrationYear.eq(year))
            .count(&self.db)
            .await?;
        let mut number = RegistrationNumber::for_year(&self.registration_prefix, year, registered)?;

        for _ in 0..REGISTRATION_ATTEMPTS {
            let now = Utc::now().into();
            let student = students::ActiveModel {
                id: Set(Uuid::new_v4()),
                registration_number: Set(number.to_string()),
                registration_year: Set(year),
                first_name: Set(first_name.clone()),
                last_name: Set(last_name.clone()),
                other_names: Set(input.other_names.clone()),
                gender: Set(input.gender.trim().to_string()),
                date_of_birth: Set(input.date_of_birth),
                address: Set(input.address.clone()),
                next_of_kin_name: Set(input.next_of_kin_name.clone()),
                next_of_kin_phone_number: Set(input.next_of_kin_phone_number.clone()),
                created_at: Set(now),
            };

            match student.insert(&self.db).await {
                Ok(student) => {
                    info!(
                        student_id = %student.id,
                        registration_number = %student.registration_number,
                        "Student registered"
                    );
                    return Ok(student);
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    warn!(registration_number = %number, "Registration number taken, retrying");
                    number = number.successor()?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StudentError::RegistrationExhausted)
    }

    /// Gets a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the student does not exist.
    pub async fn get_student(&self, id: Uuid) -> Result<students::Model, StudentError> {
        students::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StudentError::NotFound(id))
    }

    /// Enrolls a student into a class for one term.
    ///
    /// # Errors
    ///
    /// Returns an error if any referenced record is missing, the term is not
    /// part of the session, or the enrollment already exists.
    pub async fn enroll(
        &self,
        input: EnrollStudentInput,
    ) -> Result<enrollments::Model, StudentError> {
        self.get_student(input.student_id).await?;

        classes::Entity::find_by_id(input.class_id)
            .one(&self.db)
            .await?
            .ok_or(StudentError::ClassNotFound(input.class_id))?;

        academic_sessions::Entity::find_by_id(input.session_id)
            .one(&self.db)
            .await?
            .ok_or(StudentError::SessionNotFound(input.session_id))?;

        let term = terms::Entity::find_by_id(input.term_id)
            .one(&self.db)
            .await?
            .ok_or(StudentError::TermNotFound(input.term_id))?;
        if term.session_id != input.session_id {
            return Err(StudentError::TermSessionMismatch {
                term_id: input.term_id,
                session_id: input.session_id,
            });
        }

        let existing = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(input.student_id))
            .filter(enrollments::Column::ClassId.eq(input.class_id))
            .filter(enrollments::Column::SessionId.eq(input.session_id))
            .filter(enrollments::Column::TermId.eq(input.term_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(StudentError::DuplicateEnrollment);
        }

        let enrollment = enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(input.student_id),
            class_id: Set(input.class_id),
            session_id: Set(input.session_id),
            term_id: Set(input.term_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(
            student_id = %input.student_id,
            class_id = %input.class_id,
            term_id = %input.term_id,
            "Student enrolled"
        );

        Ok(enrollment)
    }

    /// Lists a student's enrollments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<enrollments::Model>, StudentError> {
        Ok(enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student_id))
            .order_by_asc(enrollments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
