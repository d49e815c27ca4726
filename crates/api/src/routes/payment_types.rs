//! Payment type and discount routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use bursary_db::repositories::{CreateDiscountInput, PaymentTypeRepository};

use crate::{AppState, error::error_response};

/// Creates the payment type routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment-types", post(create_payment_type))
        .route("/discounts", post(create_discount))
}

/// Request body for creating a payment type.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentTypeRequest {
    /// Unique name.
    pub name: String,
    /// Fee due per period.
    pub amount: Decimal,
    /// Description.
    pub description: Option<String>,
}

/// Request body for granting a discount.
#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    /// Student.
    pub student_id: Uuid,
    /// Fee category.
    pub payment_type_id: Uuid,
    /// Session of the period.
    pub session_id: Uuid,
    /// Term of the period.
    pub term_id: Uuid,
    /// Amount off the fee.
    pub amount: Decimal,
    /// Reason.
    pub reason: Option<String>,
}

/// POST `/payment-types` - Create a fee category.
async fn create_payment_type(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentTypeRequest>,
) -> impl IntoResponse {
    let repo = PaymentTypeRepository::new((*state.db).clone());

    match repo
        .create_payment_type(&payload.name, payload.amount, payload.description)
        .await
    {
        Ok(payment_type) => (StatusCode::CREATED, Json(payment_type)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST `/discounts` - Grant a discount for one period.
async fn create_discount(
    State(state): State<AppState>,
    Json(payload): Json<CreateDiscountRequest>,
) -> impl IntoResponse {
    let repo = PaymentTypeRepository::new((*state.db).clone());

    let input = CreateDiscountInput {
        student_id: payload.student_id,
        payment_type_id: payload.payment_type_id,
        session_id: payload.session_id,
        term_id: payload.term_id,
        amount: payload.amount,
        reason: payload.reason,
    };

    match repo.create_discount(input).await {
        Ok(discount) => (StatusCode::CREATED, Json(discount)).into_response(),
        Err(e) => error_response(e),
    }
}
