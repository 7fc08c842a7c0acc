//! Shared types for the civic issue platform
//!
//! Common types used by the server crate and by API clients: error codes,
//! the response envelope, pagination helpers and the department / issue
//! domain models.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode, FieldError};
pub use request::PageRequest;
pub use response::{ApiResponse, Page, Pagination};
