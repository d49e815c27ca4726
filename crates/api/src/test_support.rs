//! Helpers for router tests: an in-memory SQLite state and JSON requests.

#![allow(clippy::missing_panics_doc)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bursary_db::schema;
use bursary_shared::BillingConfig;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, create_router};

/// Builds a router over a fresh in-memory database.
pub async fn test_app() -> Router {
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

    create_router(AppState {
        db: Arc::new(db),
        billing: Arc::new(BillingConfig::default()),
    })
}

/// Sends a request and returns the status with the parsed JSON body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

/// IDs created by [`seed_school`].
pub struct School {
    pub student_id: String,
    pub payment_type_id: String,
    pub account_id: String,
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}

/// Sets up one session of three terms, a class, an enrolled student, and a
/// tuition fee of 5000 linked to an account, all through the API.
pub async fn seed_school(app: &Router) -> School {
    let (status, session) = send(
        app,
        "POST",
        "/api/v1/sessions",
        Some(json!({ "name": "2025/2026" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = id_of(&session);

    let mut term_ids = Vec::new();
    for (name, start, end) in [
        ("First Term", "2025-01-06", "2025-04-04"),
        ("Second Term", "2025-05-05", "2025-08-01"),
        ("Third Term", "2025-09-08", "2025-12-12"),
    ] {
        let (status, term) = send(
            app,
            "POST",
            "/api/v1/terms",
            Some(json!({
                "session_id": session_id,
                "name": name,
                "start_date": start,
                "end_date": end,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        term_ids.push(id_of(&term));
    }

    let (status, class) = send(app, "POST", "/api/v1/classes", Some(json!({ "name": "JSS 1" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, student) = send(
        app,
        "POST",
        "/api/v1/students",
        Some(json!({
            "first_name": "Ada",
            "last_name": "Obi",
            "gender": "F",
            "date_of_birth": "2014-03-09",
            "registration_year": 2025,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let student_id = id_of(&student);

    let (status, _) = send(
        app,
        "POST",
        "/api/v1/enrollments",
        Some(json!({
            "student_id": student_id,
            "class_id": id_of(&class),
            "session_id": session_id,
            "term_id": term_ids[0],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, payment_type) = send(
        app,
        "POST",
        "/api/v1/payment-types",
        Some(json!({ "name": "Tuition", "amount": "5000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let payment_type_id = id_of(&payment_type);

    let (status, account) = send(
        app,
        "POST",
        "/api/v1/accounts",
        Some(json!({ "name": "School Fees" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let account_id = id_of(&account);

    let (status, _) = send(
        app,
        "POST",
        "/api/v1/payment-type-accounts",
        Some(json!({
            "payment_type_id": payment_type_id,
            "account_id": account_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    School {
        student_id,
        payment_type_id,
        account_id,
    }
}
