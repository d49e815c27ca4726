//! Student routes: registration, lookup, and enrollment.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use bursary_db::repositories::{CreateStudentInput, EnrollStudentInput, StudentRepository};

use crate::{AppState, error::error_response};

/// Creates the student routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student))
        .route("/students/{student_id}", get(get_student))
        .route("/enrollments", post(enroll_student))
}

/// Request body for registering a student.
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Other names.
    pub other_names: Option<String>,
    /// Gender.
    pub gender: String,
    /// Date of birth (YYYY-MM-DD).
    pub date_of_birth: NaiveDate,
    /// Home address.
    pub address: Option<String>,
    /// Next of kin.
    pub next_of_kin_name: Option<String>,
    /// Next of kin phone number.
    pub next_of_kin_phone_number: Option<String>,
    /// Registration year; current year when omitted.
    pub registration_year: Option<i32>,
}

/// Request body for enrolling a student.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// Student.
    pub student_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Session.
    pub session_id: Uuid,
    /// Term within the session.
    pub term_id: Uuid,
}

fn repository(state: &AppState) -> StudentRepository {
    StudentRepository::new(
        (*state.db).clone(),
        state.billing.registration_prefix.clone(),
    )
}

/// POST `/students` - Register a student.
async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<CreateStudentRequest>,
) -> impl IntoResponse {
    let input = CreateStudentInput {
        first_name: payload.first_name,
        last_name: payload.last_name,
        other_names: payload.other_names,
        gender: payload.gender,
        date_of_birth: payload.date_of_birth,
        address: payload.address,
        next_of_kin_name: payload.next_of_kin_name,
        next_of_kin_phone_number: payload.next_of_kin_phone_number,
        registration_year: payload.registration_year,
    };

    match repository(&state).create_student(input).await {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET `/students/{student_id}` - Student detail with enrollments.
async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = repository(&state);

    let student = match repo.get_student(student_id).await {
        Ok(student) => student,
        Err(e) => return error_response(e),
    };

    match repo.list_enrollments(student_id).await {
        Ok(enrollments) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "student": student,
                "enrollments": enrollments,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST `/enrollments` - Enroll a student into a class for one term.
async fn enroll_student(
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> impl IntoResponse {
    let input = EnrollStudentInput {
        student_id: payload.student_id,
        class_id: payload.class_id,
        session_id: payload.session_id,
        term_id: payload.term_id,
    };

    match repository(&state).enroll(input).await {
        Ok(enrollment) => {
            info!(enrollment_id = %enrollment.id, "Enrollment created");
            (StatusCode::CREATED, Json(enrollment)).into_response()
        }
        Err(e) => error_response(e),
    }
}
