//! Cash account routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use bursary_db::entities::sea_orm_active_enums::AccountStatus;
use bursary_db::repositories::{AccountRepository, CreateAccountInput};

use crate::{AppState, error::error_response};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{account_id}", get(get_account))
        .route("/payment-type-accounts", post(link_payment_type))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Unique name.
    pub name: String,
    /// Person responsible.
    pub owner: Option<String>,
    /// Access notes.
    pub permissions: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Minimum balance; zero when omitted.
    pub minimum_balance: Option<Decimal>,
    /// Initial status: active, closed, or frozen.
    pub status: Option<AccountStatus>,
}

/// Request body for linking a payment type to an account.
#[derive(Debug, Deserialize)]
pub struct LinkPaymentTypeRequest {
    /// Fee category.
    pub payment_type_id: Uuid,
    /// Account credited with its collections.
    pub account_id: Uuid,
}

/// POST `/accounts` - Create a cash account.
async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    let input = CreateAccountInput {
        name: payload.name,
        owner: payload.owner,
        permissions: payload.permissions,
        notes: payload.notes,
        minimum_balance: payload.minimum_balance.unwrap_or(Decimal::ZERO),
        status: payload.status,
    };

    match repo.create_account(input).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET `/accounts/{account_id}` - Account detail with its balance.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo.get_account(account_id).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST `/payment-type-accounts` - Link a payment type to an account.
async fn link_payment_type(
    State(state): State<AppState>,
    Json(payload): Json<LinkPaymentTypeRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo
        .link_payment_type(payload.payment_type_id, payload.account_id)
        .await
    {
        Ok(link) => (StatusCode::CREATED, Json(link)).into_response(),
        Err(e) => error_response(e),
    }
}
