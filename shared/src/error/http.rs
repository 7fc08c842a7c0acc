//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,

            Self::NotFound | Self::DepartmentNotFound | Self::IssueNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::AlreadyExists
            | Self::DepartmentCodeExists
            | Self::DepartmentEmailExists
            | Self::DepartmentNameExists
            | Self::DepartmentAccountBound
            | Self::IssueInvalidTransition => StatusCode::CONFLICT,

            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            Self::PermissionDenied
            | Self::DepartmentRoleRequired
            | Self::AdminRequired
            | Self::AdminSuspended
            | Self::DepartmentNotBound => StatusCode::FORBIDDEN,

            // Transient, client can retry
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            Self::InvalidRequest | Self::InvalidFormat => StatusCode::BAD_REQUEST,
        }
    }
}
