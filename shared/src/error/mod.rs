//! Unified error system for the civic platform
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages and field errors
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Department errors
//! - 4xxx: Issue errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::DepartmentNotFound);
//! assert_eq!(err.http_status().as_u16(), 404);
//!
//! let err = AppError::conflict(ErrorCode::DepartmentCodeExists, "code", "ROADS");
//! assert_eq!(err.errors[0].field, "code");
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, FieldError};
