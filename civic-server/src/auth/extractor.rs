//! Principal extractors
//!
//! Each extractor reuses what the middleware stored in the request
//! extensions and falls back to running the same checks itself.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::middleware::{authenticate, authenticate_admin, resolve_department};
use crate::auth::{AdminPrincipal, CurrentUser, DepartmentPrincipal};
use crate::core::ServerState;
use shared::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(state, &parts.headers, &parts.uri)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl FromRequestParts<ServerState> for AdminPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<AdminPrincipal>() {
            return Ok(principal.clone());
        }

        let principal = authenticate_admin(state, &parts.headers, &parts.uri).await?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

impl FromRequestParts<ServerState> for DepartmentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<DepartmentPrincipal>() {
            return Ok(principal.clone());
        }

        let mut user = CurrentUser::from_request_parts(parts, state).await?;
        let principal = resolve_department(state, &mut user).await?;
        parts.extensions.insert(user);
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}
