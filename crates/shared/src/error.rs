//! Application-wide error types.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// A single failed field in a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the offending field.
    pub field: String,
    /// Human readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Stable machine-readable code.
        code: &'static str,
        /// Description of what was missing.
        message: String,
    },

    /// Malformed or missing input.
    #[error("Validation error: {} field(s) invalid", .0.len())]
    Validation(Vec<FieldError>),

    /// Business rule violation.
    #[error("Business rule violation: {message}")]
    BusinessRule {
        /// Stable machine-readable code identifying the rule.
        code: &'static str,
        /// Wire name of the field that tripped the rule, if any.
        field: Option<&'static str>,
        /// Human readable message.
        message: String,
    },

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a business rule violation.
    #[must_use]
    pub fn business_rule(
        code: &'static str,
        field: Option<&'static str>,
        message: impl Into<String>,
    ) -> Self {
        Self::BusinessRule {
            code,
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a not found error.
    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule { .. } => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound { code, .. } | Self::BusinessRule { code, .. } => *code,
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors caused by infrastructure rather than the request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Builds the JSON body sent to clients.
    ///
    /// Server errors never leak their inner message.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation(fields) => {
                let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
                for f in fields {
                    grouped
                        .entry(f.field.as_str())
                        .or_default()
                        .push(f.message.as_str());
                }
                json!({
                    "error": self.error_code(),
                    "message": "Request validation failed",
                    "fields": grouped,
                })
            }
            Self::BusinessRule { field, message, .. } => json!({
                "error": self.error_code(),
                "field": field,
                "message": message,
            }),
            Self::NotFound { message, .. } => json!({
                "error": self.error_code(),
                "message": message,
            }),
            Self::Unauthorized(message) | Self::Forbidden(message) | Self::Conflict(message) => {
                json!({
                    "error": self.error_code(),
                    "message": message,
                })
            }
            Self::Database(_) | Self::Internal(_) => json!({
                "error": self.error_code(),
                "message": "An internal error occurred",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
        assert_eq!(AppError::not_found("X", "").status_code(), 404);
        assert_eq!(AppError::Validation(vec![]).status_code(), 400);
        assert_eq!(AppError::business_rule("X", None, "").status_code(), 422);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AppError::business_rule("INSUFFICIENT_FUNDS", Some("valor"), "").error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            AppError::not_found("BANK_ACCOUNT_NOT_FOUND", "").error_code(),
            "BANK_ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            AppError::Validation(vec![]).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_business_rule_body_names_field() {
        let body = AppError::business_rule("SAME_ACCOUNT", Some("contaDestinoId"), "same").to_body();
        assert_eq!(body["error"], "SAME_ACCOUNT");
        assert_eq!(body["field"], "contaDestinoId");
        assert_eq!(body["message"], "same");
    }

    #[test]
    fn test_validation_body_groups_fields() {
        let body = AppError::Validation(vec![
            FieldError::new("valor", "is required"),
            FieldError::new("descricao", "must not be empty"),
            FieldError::new("valor", "must be a number"),
        ])
        .to_body();

        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["fields"]["valor"].as_array().unwrap().len(), 2);
        assert_eq!(body["fields"]["descricao"][0], "must not be empty");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let body = AppError::Database("connection refused at 10.0.0.3".into()).to_body();
        assert_eq!(body["message"], "An internal error occurred");
        assert!(AppError::Internal("x".into()).is_server_error());
        assert!(!AppError::Forbidden("x".into()).is_server_error());
    }
}
