//! Receipt lookup routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use bursary_core::billing::ReceiptNumber;
use bursary_db::repositories::ReceiptRepository;
use bursary_shared::AppError;

use crate::{AppState, error::error_response};

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/receipts/{receipt_number}", get(get_receipt))
}

/// GET `/receipts/{receipt_number}` - Composed receipt data.
///
/// Numbers failing the check digit are rejected before touching the store.
async fn get_receipt(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> impl IntoResponse {
    let Some(number) = ReceiptNumber::parse(&receipt_number) else {
        return error_response(AppError::Validation(format!(
            "Malformed receipt number: {receipt_number}"
        )));
    };

    let repo = ReceiptRepository::new((*state.db).clone());

    match repo.find_by_number(number.as_str()).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => error_response(e),
    }
}
