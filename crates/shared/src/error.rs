//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Billing and calendar rule violations arrive as [`AppError::Rule`], which
/// keeps the domain's own error code for the response.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Domain rule violation with its own code and status.
    #[error("{message}")]
    Rule {
        /// HTTP status code.
        status: u16,
        /// Domain error code (e.g., "overpayment").
        code: &'static str,
        /// Human-readable message.
        message: String,
        /// Whether the same request may succeed when retried.
        retryable: bool,
    },
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
            Self::Rule { status, .. } => *status,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::BusinessRule(_) => "business_rule_violation",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::Internal(_) => "internal_error",
            Self::Rule { code, .. } => code,
        }
    }

    /// Returns the message safe to show to API clients.
    ///
    /// Database and internal failures are masked.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::BusinessRule(msg)
            | Self::Conflict(msg)
            | Self::Rule { message: msg, .. } => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
        }
    }

    /// Returns true if the client may retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Rule { retryable: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::BusinessRule(String::new()), 422, "business_rule_violation")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Database(String::new()), 500, "database_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_rule_keeps_domain_code() {
        let err = AppError::Rule {
            status: 500,
            code: "receipt_number_exhausted",
            message: "Could not generate a unique receipt number".into(),
            retryable: true,
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "receipt_number_exhausted");
        assert_eq!(
            err.public_message(),
            "Could not generate a unique receipt number"
        );
        assert!(err.is_retryable());
        assert!(!AppError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("msg".into()).to_string(),
            "Not found: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
        assert_eq!(
            AppError::Database("msg".into()).to_string(),
            "Database error: msg"
        );
    }

    #[test]
    fn test_public_message_masks_internal_failures() {
        assert_eq!(
            AppError::Database("connection reset".into()).public_message(),
            "An error occurred"
        );
        assert_eq!(
            AppError::Validation("amount must be positive".into()).public_message(),
            "amount must be positive"
        );
    }
}
