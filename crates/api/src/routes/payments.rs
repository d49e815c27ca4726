//! Payment routes.
//!
//! `POST /payments` is the single entry point for money received from a
//! student. The response lists one receipt per posted movement: a settlement
//! of prior debt, a payment toward the next billing period, or both.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use bursary_db::repositories::{PaymentRepository, ProcessPaymentInput};

use crate::{AppState, error::error_response};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/{payment_id}", get(get_payment))
}

/// Request body for an incoming payment.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Payer.
    pub student_id: Uuid,
    /// Fee category paid for.
    pub payment_type_id: Uuid,
    /// Amount received.
    pub amount: Decimal,
    /// Payment method.
    pub amount_type: String,
}

/// POST `/payments` - Allocate and post an incoming payment.
async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone())
        .with_receipt_attempts(state.billing.receipt_number_attempts);

    let input = ProcessPaymentInput {
        student_id: payload.student_id,
        payment_type_id: payload.payment_type_id,
        amount: payload.amount,
        amount_type: payload.amount_type,
    };

    match repo.process_payment(input).await {
        Ok(receipts) => {
            info!(
                student_id = %payload.student_id,
                receipts = receipts.len(),
                "Payment accepted"
            );
            (StatusCode::CREATED, Json(json!({ "receiptData": receipts }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/payments/{payment_id}` - Payment detail.
async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.get_payment(payment_id).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => error_response(e),
    }
}
