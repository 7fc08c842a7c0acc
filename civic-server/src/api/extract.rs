//! Request body extractor
//!
//! `axum::Json` answers malformed bodies with a plain-text rejection. This
//! wrapper turns them into the standard error envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use shared::{AppError, ErrorCode};

/// JSON body that rejects with [`AppError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        // Well-formed JSON with missing or mistyped fields
        JsonRejection::JsonDataError(e) => AppError::validation(e.body_text()),
        JsonRejection::JsonSyntaxError(e) => {
            AppError::with_message(ErrorCode::InvalidFormat, e.body_text())
        }
        JsonRejection::MissingJsonContentType(_) => AppError::invalid_request(
            "Expected request with `Content-Type: application/json`",
        ),
        other => AppError::invalid_request(other.body_text()),
    }
}
