//! Academic calendar routes: sessions, terms, and classes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use bursary_db::repositories::{CalendarRepository, CreateSessionInput, CreateTermInput};

use crate::{AppState, error::error_response};

/// Creates the calendar routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/terms", post(create_term))
        .route("/classes", post(create_class))
}

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Session name (e.g., "2025/2026").
    pub name: String,
    /// Position in the calendar; next free when omitted.
    pub ordinal: Option<i32>,
}

/// Request body for creating a term.
#[derive(Debug, Deserialize)]
pub struct CreateTermRequest {
    /// Owning session.
    pub session_id: Uuid,
    /// Term name.
    pub name: String,
    /// Position within the session; next free when omitted.
    pub ordinal: Option<i32>,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Resumption date of the following term.
    pub next_term_date: Option<NaiveDate>,
}

/// Request body for creating a class.
#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    /// Class name.
    pub name: String,
}

/// POST `/sessions` - Create an academic session.
async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let repo = CalendarRepository::new((*state.db).clone());

    match repo
        .create_session(CreateSessionInput {
            name: payload.name,
            ordinal: payload.ordinal,
        })
        .await
    {
        Ok(session) => {
            info!(session_id = %session.id, ordinal = session.ordinal, "Session created");
            (StatusCode::CREATED, Json(session)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/terms` - Create a term inside a session.
async fn create_term(
    State(state): State<AppState>,
    Json(payload): Json<CreateTermRequest>,
) -> impl IntoResponse {
    let repo = CalendarRepository::new((*state.db).clone());

    let input = CreateTermInput {
        session_id: payload.session_id,
        name: payload.name,
        ordinal: payload.ordinal,
        start_date: payload.start_date,
        end_date: payload.end_date,
        next_term_date: payload.next_term_date,
    };

    match repo.create_term(input).await {
        Ok(term) => {
            info!(
                term_id = %term.id,
                session_id = %term.session_id,
                ordinal = term.ordinal,
                "Term created"
            );
            (StatusCode::CREATED, Json(term)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/classes` - Create a class.
async fn create_class(
    State(state): State<AppState>,
    Json(payload): Json<CreateClassRequest>,
) -> impl IntoResponse {
    let repo = CalendarRepository::new((*state.db).clone());

    match repo.create_class(&payload.name).await {
        Ok(class) => {
            info!(class_id = %class.id, "Class created");
            (StatusCode::CREATED, Json(class)).into_response()
        }
        Err(e) => error_response(e),
    }
}
