//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod calendar;
pub mod health;
pub mod payment_types;
pub mod payments;
pub mod receipts;
pub mod students;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(calendar::routes())
        .merge(students::routes())
        .merge(payment_types::routes())
        .merge(accounts::routes())
        .merge(payments::routes())
        .merge(receipts::routes())
}
