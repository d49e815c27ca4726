//! Student registration and enrollment tests.

mod common;

use bursary_db::entities::students;
use bursary_db::repositories::{EnrollStudentInput, StudentError, StudentRepository};
use chrono::{NaiveDate, Utc};
use common::{setup, setup_db, student_input};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn test_registration_numbers_follow_yearly_sequence() {
    let db = setup_db().await;
    let repo = StudentRepository::new(db, "IHN");

    let first = repo.create_student(student_input("Ada", "Obi")).await.unwrap();
    let second = repo.create_student(student_input("Tunde", "Bakare")).await.unwrap();

    assert_eq!(first.registration_number, "IHN/2026/1001");
    assert_eq!(second.registration_number, "IHN/2026/1002");

    let mut next_year = student_input("Ngozi", "Okafor");
    next_year.registration_year = Some(2027);
    let third = repo.create_student(next_year).await.unwrap();
    assert_eq!(third.registration_number, "IHN/2027/1001");
}

#[tokio::test]
async fn test_taken_registration_number_is_skipped() {
    let db = setup_db().await;
    let now = Utc::now().into();
    students::ActiveModel {
        id: Set(Uuid::new_v4()),
        registration_number: Set("IHN/2026/1001".to_string()),
        registration_year: Set(2025),
        first_name: Set("Legacy".to_string()),
        last_name: Set("Record".to_string()),
        other_names: Set(None),
        gender: Set("M".to_string()),
        date_of_birth: Set(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()),
        address: Set(None),
        next_of_kin_name: Set(None),
        next_of_kin_phone_number: Set(None),
        created_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let student = StudentRepository::new(db, "IHN")
        .create_student(student_input("Ada", "Obi"))
        .await
        .unwrap();

    assert_eq!(student.registration_number, "IHN/2026/1002");
}

#[tokio::test]
async fn test_duplicate_student_detected_ignoring_case() {
    let db = setup_db().await;
    let repo = StudentRepository::new(db, "IHN");
    repo.create_student(student_input("Ada", "Obi")).await.unwrap();

    let err = repo
        .create_student(student_input("ADA", " obi "))
        .await
        .unwrap_err();

    assert!(matches!(err, StudentError::DuplicateStudent { .. }));
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let db = setup_db().await;
    let repo = StudentRepository::new(db, "IHN");

    let err = repo.create_student(student_input(" ", "Obi")).await.unwrap_err();

    assert!(matches!(err, StudentError::Invalid(_)));
}

#[tokio::test]
async fn test_enrollment_rules() {
    let fx = setup().await;
    let repo = StudentRepository::new(fx.db.clone(), "IHN");

    let (session_id, term_id) = fx.period(0, 0);
    let duplicate = repo
        .enroll(EnrollStudentInput {
            student_id: fx.student.id,
            class_id: fx.class.id,
            session_id,
            term_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, StudentError::DuplicateEnrollment));

    let (other_session, _) = fx.period(1, 0);
    let mismatch = repo
        .enroll(EnrollStudentInput {
            student_id: fx.student.id,
            class_id: fx.class.id,
            session_id: other_session,
            term_id: fx.period(0, 1).1,
        })
        .await
        .unwrap_err();
    assert!(matches!(mismatch, StudentError::TermSessionMismatch { .. }));

    let (next_session, next_term) = fx.period(0, 1);
    repo.enroll(EnrollStudentInput {
        student_id: fx.student.id,
        class_id: fx.class.id,
        session_id: next_session,
        term_id: next_term,
    })
    .await
    .unwrap();

    let enrollments = repo.list_enrollments(fx.student.id).await.unwrap();
    assert_eq!(enrollments.len(), 2);
}

#[tokio::test]
async fn test_unknown_student_cannot_enroll() {
    let fx = setup().await;
    let repo = StudentRepository::new(fx.db.clone(), "IHN");
    let (session_id, term_id) = fx.period(0, 0);
    let ghost = Uuid::new_v4();

    let err = repo
        .enroll(EnrollStudentInput {
            student_id: ghost,
            class_id: fx.class.id,
            session_id,
            term_id,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StudentError::NotFound(id) if id == ghost));
}
