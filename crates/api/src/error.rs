//! JSON error responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bursary_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Converts a domain error into `{"error": code, "message": text}` with the
/// mapped status code.
///
/// Server-side failures are logged at error level and their message is masked.
/// Retryable failures carry a `Retry-After` header.
pub fn error_response(err: impl Into<AppError>) -> Response {
    let err = err.into();
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, "Request rejected");
    }

    let mut response = (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.public_message(),
        })),
    )
        .into_response();

    if err.is_retryable() {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("Student not found".into()), StatusCode::NOT_FOUND, "not_found")]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(AppError::Conflict("dup".into()), StatusCode::CONFLICT, "conflict")]
    #[case(
        AppError::BusinessRule("frozen".into()),
        StatusCode::UNPROCESSABLE_ENTITY,
        "business_rule_violation"
    )]
    #[tokio::test]
    async fn test_error_body(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let response = error_response(err);
        assert_eq!(response.status(), status);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], code);
    }

    #[tokio::test]
    async fn test_rule_code_and_retry_hint_reach_client() {
        let response = error_response(AppError::Rule {
            status: 500,
            code: "receipt_number_exhausted",
            message: "Could not generate a unique receipt number after 8 attempts".into(),
            retryable: true,
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "receipt_number_exhausted");
    }

    #[tokio::test]
    async fn test_database_message_is_masked() {
        let response = error_response(AppError::Database("connection refused".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "An error occurred");
    }
}
