//! Shared fixtures for database integration tests.
//!
//! Every test gets its own SQLite in-memory database built from the entity
//! definitions. The pool holds a single connection so the database survives
//! for the whole test.

#![allow(dead_code)]
#![allow(clippy::missing_panics_doc)]

use bursary_db::entities::{
    academic_sessions, accounts, classes, outstanding_balances, payment_types, payments, students,
    terms,
};
use bursary_db::repositories::{
    AccountRepository, CalendarRepository, CreateAccountInput, CreateSessionInput,
    CreateStudentInput, CreateTermInput, EnrollStudentInput, PaymentTypeRepository,
    StudentRepository,
};
use bursary_db::schema;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Fee of the tuition payment type in every fixture.
pub const TUITION_FEE: Decimal = dec!(5000);

/// Opens a fresh in-memory database with all tables.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open SQLite in memory");
    schema::create_tables(&db)
        .await
        .expect("Failed to create tables");
    db
}

/// A session and its terms in ordinal order.
pub struct SeededSession {
    pub session: academic_sessions::Model,
    pub terms: Vec<terms::Model>,
}

/// Calendar of two sessions with three terms each, one class, one enrolled
/// student, and a tuition fee linked to an active account.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub sessions: Vec<SeededSession>,
    pub class: classes::Model,
    pub student: students::Model,
    pub payment_type: payment_types::Model,
    pub account: accounts::Model,
}

impl Fixture {
    /// Period `(session index, term index)` as raw ids.
    pub fn period(&self, session: usize, term: usize) -> (Uuid, Uuid) {
        let s = &self.sessions[session];
        (s.session.id, s.terms[term].id)
    }
}

/// Builds the standard fixture.
pub async fn setup() -> Fixture {
    let db = setup_db().await;
    let calendar = CalendarRepository::new(db.clone());

    let mut sessions = Vec::new();
    for (year, name) in [(2025, "2025/2026"), (2026, "2026/2027")] {
        let session = calendar
            .create_session(CreateSessionInput {
                name: name.to_string(),
                ordinal: None,
            })
            .await
            .expect("Failed to create session");

        let mut session_terms = Vec::new();
        for (idx, term_name) in ["First Term", "Second Term", "Third Term"].iter().enumerate() {
            let month = 1 + 4 * u32::try_from(idx).expect("term index fits");
            let start = NaiveDate::from_ymd_opt(year, month, 1).expect("valid date");
            let end = NaiveDate::from_ymd_opt(year, month + 2, 28).expect("valid date");
            let term = calendar
                .create_term(CreateTermInput {
                    session_id: session.id,
                    name: (*term_name).to_string(),
                    ordinal: None,
                    start_date: start,
                    end_date: end,
                    next_term_date: None,
                })
                .await
                .expect("Failed to create term");
            session_terms.push(term);
        }

        sessions.push(SeededSession {
            session,
            terms: session_terms,
        });
    }

    let class = calendar
        .create_class("JSS 1")
        .await
        .expect("Failed to create class");

    let student = register_student(&db, "Ada", "Obi").await;

    StudentRepository::new(db.clone(), "IHN")
        .enroll(EnrollStudentInput {
            student_id: student.id,
            class_id: class.id,
            session_id: sessions[0].session.id,
            term_id: sessions[0].terms[0].id,
        })
        .await
        .expect("Failed to enroll student");

    let payment_type = PaymentTypeRepository::new(db.clone())
        .create_payment_type("Tuition", TUITION_FEE, None)
        .await
        .expect("Failed to create payment type");

    let accounts_repo = AccountRepository::new(db.clone());
    let account = accounts_repo
        .create_account(CreateAccountInput {
            name: "School Fees".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create account");
    accounts_repo
        .link_payment_type(payment_type.id, account.id)
        .await
        .expect("Failed to link account");

    Fixture {
        db,
        sessions,
        class,
        student,
        payment_type,
        account,
    }
}

/// Registers a student for 2026 with fixed biographical data.
pub async fn register_student(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
) -> students::Model {
    StudentRepository::new(db.clone(), "IHN")
        .create_student(student_input(first_name, last_name))
        .await
        .expect("Failed to register student")
}

/// Registration input for 2026 with fixed biographical data.
pub fn student_input(first_name: &str, last_name: &str) -> CreateStudentInput {
    CreateStudentInput {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        other_names: None,
        gender: "F".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2014, 3, 9).expect("valid date"),
        address: None,
        next_of_kin_name: Some("Chioma Obi".to_string()),
        next_of_kin_phone_number: Some("08030000000".to_string()),
        registration_year: Some(2026),
    }
}

/// Inserts an earlier payment directly.
pub async fn seed_payment(
    db: &DatabaseConnection,
    fx: &Fixture,
    period: (Uuid, Uuid),
    amount: Decimal,
    regular: bool,
) -> payments::Model {
    let now = Utc::now().into();
    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(fx.student.id),
        payment_type_id: Set(fx.payment_type.id),
        session_id: Set(period.0),
        term_id: Set(period.1),
        amount: Set(amount),
        amount_type: Set("cash".to_string()),
        payment_date: Set(now),
        regular_payment: Set(regular),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed payment")
}

/// Inserts an outstanding balance directly.
pub async fn seed_outstanding(
    db: &DatabaseConnection,
    fx: &Fixture,
    period: (Uuid, Uuid),
    amount: Decimal,
) -> outstanding_balances::Model {
    let now = Utc::now().into();
    outstanding_balances::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(fx.student.id),
        payment_type_id: Set(fx.payment_type.id),
        session_id: Set(period.0),
        term_id: Set(period.1),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed outstanding balance")
}
