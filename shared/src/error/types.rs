//! Application error type

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use crate::response::ApiResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// A single field-level problem reported back to the client
///
/// Validation failures carry `field` + `message`; uniqueness conflicts also
/// echo the offending `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Application error with structured error code and details
///
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable message
/// - Per-field errors for validation and conflict responses
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Field-level errors (validation / conflict)
    pub errors: Vec<FieldError>,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            errors: Vec::new(),
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Append a field-level error
    pub fn with_field_error(mut self, error: FieldError) -> Self {
        self.errors.push(error);
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error without field information
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a validation error for a single field
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed).with_field_error(FieldError::new(field, msg))
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a uniqueness conflict naming the offending field and value
    pub fn conflict(code: ErrorCode, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let message = format!("{} already exists", field);
        Self::new(code).with_field_error(FieldError::new(field, message).with_value(value))
    }

    /// Create a not authenticated error
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create an invalid token error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Create a token expired error
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Message safe to show to clients; system errors never leak internals
    pub fn public_message(&self) -> String {
        if self.code.category() == ErrorCategory::System {
            self.code.message().to_string()
        } else {
            self.message.clone()
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation_errors(&errors, None, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self {
            code: ErrorCode::ValidationFailed,
            message: ErrorCode::ValidationFailed.message().to_string(),
            errors: fields,
            details: None,
        }
    }
}

fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut Vec<FieldError>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", path, err.code));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                flatten_validation_errors(inner, Some(&path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_path = format!("{}[{}]", path, index);
                    flatten_validation_errors(inner, Some(&item_path), out);
                }
            }
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();

        // Log system errors
        if self.code.category() == ErrorCategory::System {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        let body = ApiResponse::<()>::error(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Inner {
        #[validate(range(min = -90.0, max = 90.0, message = "lat out of range"))]
        lat: f64,
    }

    #[derive(Debug, Validate)]
    struct Outer {
        #[validate(length(min = 2, message = "name too short"))]
        name: String,
        #[validate(nested)]
        inner: Inner,
    }

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
        assert!(err.errors.is_empty());
        assert!(err.details.is_none());
    }

    #[test]
    fn test_conflict_carries_field_and_value() {
        let err = AppError::conflict(ErrorCode::DepartmentCodeExists, "code", "ROADS");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "code");
        assert_eq!(err.errors[0].value, Some(Value::from("ROADS")));
    }

    #[test]
    fn test_from_validation_errors_flattens_nested_paths() {
        let input = Outer {
            name: "x".into(),
            inner: Inner { lat: 120.0 },
        };
        let err: AppError = input.validate().unwrap_err().into();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["inner.lat", "name"]);
        assert_eq!(err.errors[1].message, "name too short");
    }

    #[test]
    fn test_public_message_hides_system_details() {
        let err = AppError::database("UNIQUE constraint failed: department.code");
        assert_eq!(err.public_message(), "Database error");

        let err = AppError::forbidden("Department role required");
        assert_eq!(err.public_message(), "Department role required");
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::IssueNotFound, "Issue 7 not found");
        assert_eq!(format!("{}", err), "Issue 7 not found");
    }
}
